//! Loading a patch onto a channel.

use crate::setlist::Patch;
use cueflow_midi::{cc, MidiSink};

/// Sends whatever a synthesizer needs to select `patch` on `channel`.
pub trait PatchChanger: Send + Sync {
    fn change_patch(&self, sink: &dyn MidiSink, patch: &Patch, channel: u8)
        -> cueflow_midi::Result<()>;
}

/// Bank select (CC0, then CC32 if the bank has an LSB) followed by a program
/// change. Works for most General MIDI compatible hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct BankProgramChange;

impl PatchChanger for BankProgramChange {
    fn change_patch(
        &self,
        sink: &dyn MidiSink,
        patch: &Patch,
        channel: u8,
    ) -> cueflow_midi::Result<()> {
        if let Some(bank) = patch.bank {
            sink.send_control_change(channel, cc::BANK_SELECT_MSB, bank.msb)?;
            if let Some(lsb) = bank.lsb {
                sink.send_control_change(channel, cc::BANK_SELECT_LSB, lsb)?;
            }
        }
        sink.send_program_change(channel, patch.program)
    }
}
