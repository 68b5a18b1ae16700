//! MIDI output: device enumeration, connection, and message sending via a dedicated thread.

use crate::error::{Error, Result};
use crate::output::{MidiSink, OutputMessage};
use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use midir::{MidiOutput, MidiOutputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const CLIENT_NAME: &str = "cueflow-output";

#[derive(Debug, Clone)]
pub struct MidiOutputDevice {
    pub index: usize,
    pub name: String,
}

enum OutputCommand {
    Connect(usize),
    Disconnect,
    Send(OutputMessage),
    Shutdown,
}

/// Owns the `midir` connection on its own thread; `send` only enqueues.
///
/// Clone is cheap and every clone talks to the same thread.
#[derive(Clone)]
pub struct MidiOutputManager {
    command_sender: Sender<OutputCommand>,
    connected_device: Arc<ArcSwap<Option<String>>>,
    is_connected: Arc<AtomicBool>,
}

impl MidiOutputManager {
    pub fn new() -> Result<Self> {
        let (command_sender, command_receiver) = bounded(1024);
        let connected_device = Arc::new(ArcSwap::new(Arc::new(None)));
        let is_connected = Arc::new(AtomicBool::new(false));

        let connected_device_clone = Arc::clone(&connected_device);
        let is_connected_clone = Arc::clone(&is_connected);

        thread::Builder::new()
            .name("cueflow-midi-output".to_string())
            .spawn(move || {
                Self::output_thread(command_receiver, connected_device_clone, is_connected_clone);
            })
            .map_err(|e| Error::MidiDevice(format!("failed to spawn output thread: {e}")))?;

        Ok(Self {
            command_sender,
            connected_device,
            is_connected,
        })
    }

    fn output_thread(
        command_receiver: Receiver<OutputCommand>,
        connected_device: Arc<ArcSwap<Option<String>>>,
        is_connected: Arc<AtomicBool>,
    ) {
        let mut connection: Option<MidiOutputConnection> = None;

        loop {
            match command_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(OutputCommand::Connect(device_index)) => {
                    connection = None;
                    match Self::connect_to_device(device_index) {
                        Ok((conn, name)) => {
                            debug!("Connected MIDI output {}: {}", device_index, name);
                            connection = Some(conn);
                            is_connected.store(true, Ordering::SeqCst);
                            connected_device.store(Arc::new(Some(name)));
                        }
                        Err(e) => {
                            warn!("MIDI output connect failed: {}", e);
                            is_connected.store(false, Ordering::SeqCst);
                            connected_device.store(Arc::new(None));
                        }
                    }
                }
                Ok(OutputCommand::Disconnect) => {
                    if connection.take().is_some() {
                        is_connected.store(false, Ordering::SeqCst);
                        connected_device.store(Arc::new(None));
                    }
                }
                Ok(OutputCommand::Send(msg)) => {
                    if let Some(ref mut conn) = connection {
                        if let Err(e) = conn.send(&msg.to_bytes()) {
                            warn!("MIDI output send failed: {}", e);
                        }
                    } else {
                        debug!("Cannot send MIDI message: no device connected");
                    }
                }
                Ok(OutputCommand::Shutdown) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn connect_to_device(device_index: usize) -> Result<(MidiOutputConnection, String)> {
        let midi_output = MidiOutput::new(CLIENT_NAME)?;

        let ports = midi_output.ports();
        let port = ports.get(device_index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI output device {} not found", device_index))
        })?;

        let port_name = midi_output
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", device_index));

        let connection = midi_output.connect(port, CLIENT_NAME)?;

        Ok((connection, port_name))
    }

    pub fn list_devices() -> Vec<MidiOutputDevice> {
        let mut devices = Vec::new();
        if let Ok(midi_output) = MidiOutput::new("cueflow-device-list") {
            for (index, port) in midi_output.ports().iter().enumerate() {
                let name = midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(MidiOutputDevice { index, name });
            }
        }
        devices
    }

    pub fn connect(&self, device_index: usize) -> Result<()> {
        self.command_sender
            .send(OutputCommand::Connect(device_index))
            .map_err(|_| Error::MidiDevice("MIDI output thread not running".to_string()))
    }

    /// Case-insensitive partial match on the port name.
    pub fn connect_by_name(&self, name: &str) -> Result<()> {
        let needle = name.to_lowercase();
        let device = Self::list_devices()
            .into_iter()
            .find(|d| d.name.to_lowercase().contains(&needle))
            .ok_or_else(|| {
                Error::MidiDevice(format!("No MIDI output device found matching '{}'", name))
            })?;
        self.connect(device.index)
    }

    pub fn disconnect(&self) {
        let _ = self.command_sender.send(OutputCommand::Disconnect);
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub fn connected_device_name(&self) -> Option<String> {
        self.connected_device.load().as_ref().clone()
    }
}

impl MidiSink for MidiOutputManager {
    fn send(&self, message: OutputMessage) -> Result<()> {
        match self.command_sender.try_send(OutputCommand::Send(message)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(Error::MidiPort("output queue full".to_string()))
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(Error::MidiDevice("MIDI output thread not running".to_string()))
            }
        }
    }
}

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        // Only the last handle stops the thread, which holds a reference too.
        if Arc::strong_count(&self.is_connected) <= 2 {
            let _ = self.command_sender.send(OutputCommand::Shutdown);
        }
    }
}
