use super::{AssignmentNode, PatchUsage};
use cueflow_midi::NoteRange;

/// Groups assignment nodes under a common outer range. A merge only answers
/// notes inside its own range, then forwards them to each child that answers.
#[derive(Debug, Clone)]
pub struct PatchMerge {
    pub range: NoteRange,
    pub children: Vec<AssignmentNode>,
}

impl PatchMerge {
    pub fn new(range: NoteRange) -> Self {
        Self {
            range,
            children: Vec::new(),
        }
    }

    pub fn with_usage(mut self, usage: PatchUsage) -> Self {
        self.children.push(AssignmentNode::Usage(usage));
        self
    }

    pub fn with_merge(mut self, merge: PatchMerge) -> Self {
        self.children.push(AssignmentNode::Merge(merge));
        self
    }

    pub fn push(&mut self, node: impl Into<AssignmentNode>) {
        self.children.push(node.into());
    }
}
