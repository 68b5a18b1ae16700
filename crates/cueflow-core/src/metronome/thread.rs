//! Metronome clocked by a dedicated thread.

use super::{click_interval, Metronome, MetronomeListener, TapTempo, CLICKS_PER_BEAT};
use crate::config::{MAX_BPM, MIN_BPM};
use crate::{Error, Result};
use atomic_float::AtomicF64;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const IDLE_POLL: Duration = Duration::from_millis(100);

enum MetronomeCommand {
    Start,
    Stop,
    Restart,
    SetBpm(f64),
    SetListener(Weak<dyn MetronomeListener>),
    Shutdown,
}

/// Wall-clock metronome. Commands are queued to the clock thread, which also
/// delivers every listener callback.
///
/// Clone is cheap and every clone drives the same clock.
#[derive(Clone)]
pub struct ThreadMetronome {
    command_sender: Sender<MetronomeCommand>,
    running: Arc<AtomicBool>,
    bpm: Arc<AtomicF64>,
    taps: Arc<Mutex<TapTempo>>,
}

impl ThreadMetronome {
    pub fn new(bpm: f64, tap_reset: Duration) -> Result<Self> {
        if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
            return Err(Error::InvalidTempo(bpm));
        }
        let (command_sender, command_receiver) = unbounded();
        let running = Arc::new(AtomicBool::new(false));

        thread::Builder::new()
            .name("cueflow-metronome".to_string())
            .spawn(move || Self::clock_thread(command_receiver, bpm))
            .map_err(|e| Error::InvalidConfig(format!("failed to spawn metronome thread: {e}")))?;

        Ok(Self {
            command_sender,
            running,
            bpm: Arc::new(AtomicF64::new(bpm)),
            taps: Arc::new(Mutex::new(TapTempo::new(tap_reset))),
        })
    }

    fn clock_thread(command_receiver: Receiver<MetronomeCommand>, initial_bpm: f64) {
        let mut listener: Option<Weak<dyn MetronomeListener>> = None;
        let mut running = false;
        let mut bpm = initial_bpm;
        let mut position: u32 = 0;
        let mut next_click = Instant::now();

        let notify = |listener: &Option<Weak<dyn MetronomeListener>>,
                      f: &dyn Fn(&dyn MetronomeListener)| {
            if let Some(l) = listener.as_ref().and_then(Weak::upgrade) {
                f(l.as_ref());
            }
        };

        loop {
            if running {
                let now = Instant::now();
                if now >= next_click {
                    let clicked = position;
                    notify(&listener, &|l| l.metronome_clicked(clicked));
                    position = (position + 1) % CLICKS_PER_BEAT;
                    next_click += click_interval(bpm);
                    // Fell more than a beat behind (suspend, debugger): resync.
                    if next_click + click_interval(bpm) * CLICKS_PER_BEAT < now {
                        debug!("Metronome fell behind, resyncing");
                        next_click = now + click_interval(bpm);
                    }
                }
            }

            let timeout = if running {
                next_click.saturating_duration_since(Instant::now())
            } else {
                IDLE_POLL
            };

            match command_receiver.recv_timeout(timeout) {
                Ok(MetronomeCommand::Start) => {
                    if !running {
                        running = true;
                        position = 0;
                        next_click = Instant::now();
                        notify(&listener, &|l| l.metronome_started());
                    }
                }
                Ok(MetronomeCommand::Stop) => {
                    if running {
                        running = false;
                        notify(&listener, &|l| l.metronome_stopped());
                    }
                }
                Ok(MetronomeCommand::Restart) => {
                    running = true;
                    position = 0;
                    next_click = Instant::now();
                    notify(&listener, &|l| l.metronome_started());
                }
                Ok(MetronomeCommand::SetBpm(new_bpm)) => {
                    bpm = new_bpm;
                    notify(&listener, &|l| l.bpm_changed(new_bpm));
                }
                Ok(MetronomeCommand::SetListener(new_listener)) => {
                    listener = Some(new_listener);
                }
                Ok(MetronomeCommand::Shutdown) => break,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn command(&self, command: MetronomeCommand) {
        if self.command_sender.send(command).is_err() {
            warn!("Metronome thread not running");
        }
    }
}

impl Metronome for ThreadMetronome {
    fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.command(MetronomeCommand::Start);
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.command(MetronomeCommand::Stop);
    }

    fn restart(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.command(MetronomeCommand::Restart);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn bpm(&self) -> f64 {
        self.bpm.load(Ordering::Acquire)
    }

    fn set_bpm(&self, bpm: f64) {
        if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
            warn!("Ignoring tempo {} outside {}-{}", bpm, MIN_BPM, MAX_BPM);
            return;
        }
        self.bpm.store(bpm, Ordering::Release);
        self.command(MetronomeCommand::SetBpm(bpm));
    }

    fn tap_tempo(&self) {
        let bpm = self.taps.lock().tap(Instant::now());
        if let Some(bpm) = bpm {
            self.set_bpm(bpm);
        }
    }

    fn set_listener(&self, listener: Weak<dyn MetronomeListener>) {
        self.command(MetronomeCommand::SetListener(listener));
    }
}

impl Drop for ThreadMetronome {
    fn drop(&mut self) {
        // Only the last handle stops the thread.
        if Arc::strong_count(&self.running) == 1 {
            let _ = self.command_sender.send(MetronomeCommand::Shutdown);
        }
    }
}
