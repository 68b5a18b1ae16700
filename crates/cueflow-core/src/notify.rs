//! Performance notifications for user interfaces.

use crate::assign::UsageId;
use crate::setlist::{SongId, SynthId};
use crossbeam_channel::{Sender, TrySendError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum PerformanceEvent {
    LocationChanged {
        index: usize,
        song: SongId,
        measure: u32,
        name: String,
    },
    ChannelPoolExhausted {
        synth: SynthId,
        usage: UsageId,
    },
    UnknownSynthesizer {
        synth: SynthId,
        usage: UsageId,
    },
    Panic,
    MetronomeStarted,
    MetronomeStopped,
    BpmChanged(f64),
    ShutDown,
}

/// Receives engine events. Called with the engine lock held; must not block.
pub trait PerformanceNotifier: Send + Sync {
    fn notify(&self, event: PerformanceEvent);
}

impl PerformanceNotifier for () {
    fn notify(&self, _event: PerformanceEvent) {}
}

impl<N: PerformanceNotifier + ?Sized> PerformanceNotifier for std::sync::Arc<N> {
    fn notify(&self, event: PerformanceEvent) {
        (**self).notify(event)
    }
}

impl PerformanceNotifier for Sender<PerformanceEvent> {
    fn notify(&self, event: PerformanceEvent) {
        match self.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => debug!("Notification queue full, dropping {:?}", event),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
