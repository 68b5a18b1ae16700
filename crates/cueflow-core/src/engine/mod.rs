//! The performance engine.
//!
//! One lock guards the whole session. MIDI input, navigation and metronome
//! clicks each take it for the duration of one event, so a cue change never
//! interleaves with note routing or a generator step.
//!
//! # Example
//! ```ignore
//! let sink = Arc::new(CaptureSink::new());
//! let engine = PerformanceEngine::builder(setlist)
//!     .sink(sink.clone())
//!     .build()?;
//!
//! engine.advance();
//! engine.send(InputMessage::note_on(0, 60, 100));
//! ```

mod dispatch;
mod state;

pub use state::Position;

use crate::allocator::Assignments;
use crate::assign::UsageId;
use crate::config::EngineConfig;
use crate::metronome::{Metronome, MetronomeListener, ThreadMetronome};
use crate::notify::{PerformanceEvent, PerformanceNotifier};
use crate::patch_change::{BankProgramChange, PatchChanger};
use crate::setlist::{CueKey, Setlist, SongId};
use crate::{Error, Result};
use cueflow_midi::{InputMessage, KeyboardId, MidiSink};
use parking_lot::Mutex;
use state::{global_triggers, EngineState, Output, Session};
use std::sync::{Arc, Weak};

struct EngineShared {
    state: Mutex<EngineState>,
    notifier: Arc<dyn PerformanceNotifier>,
}

impl MetronomeListener for EngineShared {
    fn metronome_clicked(&self, position: u32) {
        self.state.lock().metronome_clicked(position);
    }

    fn metronome_started(&self) {
        self.notifier.notify(PerformanceEvent::MetronomeStarted);
    }

    fn metronome_stopped(&self) {
        self.state.lock().silence_generators();
        self.notifier.notify(PerformanceEvent::MetronomeStopped);
    }

    fn bpm_changed(&self, bpm: f64) {
        self.notifier.notify(PerformanceEvent::BpmChanged(bpm));
    }
}

/// Handle to a running performance. Clone is cheap; all clones share one
/// session.
#[derive(Clone)]
pub struct PerformanceEngine {
    shared: Arc<EngineShared>,
}

impl PerformanceEngine {
    pub fn builder(setlist: Setlist) -> PerformanceEngineBuilder {
        PerformanceEngineBuilder::new(setlist)
    }

    /// Routes one input message.
    pub fn send(&self, message: InputMessage) {
        self.shared.state.lock().handle_input(message);
    }

    /// Releases a held key without evaluating triggers.
    pub fn note_released(&self, keyboard: KeyboardId, note: u8) {
        let mut state = self.shared.state.lock();
        state.release_held(keyboard, note);
        state.note_off(keyboard, note);
    }

    /// Delivers a metronome click. Registered metronomes call this through
    /// the listener; it is public for external clocks.
    pub fn metronome_clicked(&self, position: u32) {
        self.shared.state.lock().metronome_clicked(position);
    }

    pub fn go_to(&self, index: usize) -> Result<()> {
        self.shared.state.lock().go_to(index)
    }

    pub fn go_to_cue(&self, key: &CueKey) -> Result<()> {
        self.shared.state.lock().go_to_cue(key)
    }

    /// Goes to the cue of `song` in effect at `measure`.
    pub fn go_to_song(&self, song: SongId, measure: u32) -> Result<()> {
        self.shared.state.lock().go_to_song(song, measure)
    }

    pub fn advance(&self) {
        self.shared.state.lock().advance();
    }

    pub fn reverse(&self) {
        self.shared.state.lock().reverse();
    }

    /// Panic, then reload the first cue.
    pub fn restart(&self) {
        self.shared.state.lock().restart();
    }

    /// Re-resolves the current cue from scratch.
    pub fn reload(&self) {
        self.shared.state.lock().reload();
    }

    pub fn panic(&self) {
        self.shared.state.lock().panic();
    }

    /// Applies a structural edit and reloads the current cue. The edit is
    /// discarded if the result does not validate.
    pub fn edit_setlist(&self, edit: impl FnOnce(&mut Setlist)) -> Result<()> {
        self.shared.state.lock().edit_setlist(edit)
    }

    pub fn shutdown(&self) {
        self.shared.state.lock().shutdown();
    }

    pub fn position(&self) -> Position {
        self.shared.state.lock().position
    }

    pub fn current_cue(&self) -> Option<CueKey> {
        self.shared.state.lock().current_cue().map(|c| c.key())
    }

    pub fn current_cue_name(&self) -> Option<String> {
        self.shared.state.lock().current_cue().map(|c| c.name.clone())
    }

    pub fn assigned_channel(&self, usage: UsageId) -> Option<u8> {
        self.shared.state.lock().session.assignments.channel(usage)
    }

    pub fn assignments(&self) -> Assignments {
        self.shared.state.lock().session.assignments.clone()
    }

    /// Number of usages of the current cue holding runtime state.
    pub fn runtime_state_count(&self) -> usize {
        self.shared.state.lock().session.runtime.len()
    }

    pub fn with_setlist<R>(&self, f: impl FnOnce(&Setlist) -> R) -> R {
        f(&self.shared.state.lock().setlist)
    }

    pub fn config(&self) -> EngineConfig {
        self.shared.state.lock().config.clone()
    }

    pub fn metronome(&self) -> Arc<dyn Metronome> {
        self.shared.state.lock().metronome.clone()
    }
}

pub struct PerformanceEngineBuilder {
    setlist: Setlist,
    config: EngineConfig,
    sink: Option<Arc<dyn MidiSink>>,
    metronome: Option<Arc<dyn Metronome>>,
    patch_changer: Arc<dyn PatchChanger>,
    notifier: Arc<dyn PerformanceNotifier>,
}

impl PerformanceEngineBuilder {
    pub fn new(setlist: Setlist) -> Self {
        Self {
            setlist,
            config: EngineConfig::default(),
            sink: None,
            metronome: None,
            patch_changer: Arc::new(BankProgramChange),
            notifier: Arc::new(()),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn MidiSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Defaults to a [`ThreadMetronome`] at the configured tempo.
    pub fn metronome(mut self, metronome: Arc<dyn Metronome>) -> Self {
        self.metronome = Some(metronome);
        self
    }

    pub fn patch_changer(mut self, patch_changer: Arc<dyn PatchChanger>) -> Self {
        self.patch_changer = patch_changer;
        self
    }

    pub fn notifier(mut self, notifier: impl PerformanceNotifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn build(self) -> Result<PerformanceEngine> {
        self.config.validate()?;
        let mut setlist = self.setlist;
        setlist.sort_cues();
        setlist.validate()?;

        let sink = self
            .sink
            .ok_or_else(|| Error::InvalidConfig("no output sink configured".to_string()))?;

        let metronome: Arc<dyn Metronome> = match self.metronome {
            Some(metronome) => {
                metronome.set_bpm(self.config.initial_bpm);
                metronome
            }
            None => Arc::new(ThreadMetronome::new(
                self.config.initial_bpm,
                self.config.tap_tempo_reset(),
            )?),
        };

        let globals = global_triggers(&setlist);
        let state = EngineState {
            setlist,
            config: self.config,
            position: Position::Uninitialized,
            force_reload: false,
            session: Session::default(),
            global_triggers: globals,
            output: Output::new(sink),
            metronome: metronome.clone(),
            patch_changer: self.patch_changer,
            notifier: self.notifier.clone(),
        };
        let shared = Arc::new(EngineShared {
            state: Mutex::new(state),
            notifier: self.notifier,
        });

        let listener: Weak<dyn MetronomeListener> = Arc::downgrade(&shared) as Weak<dyn MetronomeListener>;
        metronome.set_listener(listener);

        Ok(PerformanceEngine { shared })
    }
}
