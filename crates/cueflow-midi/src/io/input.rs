//! MIDI input: device enumeration and connection.
//!
//! The `midir` connection lives on a dedicated thread; parsed messages are
//! handed to the registered handler on the `midir` callback thread.

use crate::error::{Error, Result};
use crate::message::InputMessage;
use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{MidiInput, MidiInputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const CLIENT_NAME: &str = "cueflow-input";

/// Receives every parsed message from a connected device.
pub type InputHandler = Arc<dyn Fn(InputMessage) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct MidiInputDevice {
    pub index: usize,
    pub name: String,
}

enum InputCommand {
    Connect(usize, InputHandler),
    Disconnect,
    Shutdown,
}

pub struct MidiInputManager {
    command_sender: Sender<InputCommand>,
    connected_device: Arc<ArcSwap<Option<String>>>,
    is_connected: Arc<AtomicBool>,
}

impl MidiInputManager {
    pub fn new() -> Result<Self> {
        let (command_sender, command_receiver) = bounded(16);
        let connected_device = Arc::new(ArcSwap::new(Arc::new(None)));
        let is_connected = Arc::new(AtomicBool::new(false));

        let connected_device_clone = Arc::clone(&connected_device);
        let is_connected_clone = Arc::clone(&is_connected);

        thread::Builder::new()
            .name("cueflow-midi-input".to_string())
            .spawn(move || {
                Self::input_thread(command_receiver, connected_device_clone, is_connected_clone);
            })
            .map_err(|e| Error::MidiDevice(format!("failed to spawn input thread: {e}")))?;

        Ok(Self {
            command_sender,
            connected_device,
            is_connected,
        })
    }

    fn input_thread(
        command_receiver: Receiver<InputCommand>,
        connected_device: Arc<ArcSwap<Option<String>>>,
        is_connected: Arc<AtomicBool>,
    ) {
        let mut connection: Option<MidiInputConnection<()>> = None;

        loop {
            match command_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(InputCommand::Connect(device_index, handler)) => {
                    connection = None;
                    is_connected.store(false, Ordering::SeqCst);
                    connected_device.store(Arc::new(None));

                    match Self::connect_to_device(device_index, handler) {
                        Ok((conn, name)) => {
                            debug!("Connected MIDI input {}: {}", device_index, name);
                            connection = Some(conn);
                            is_connected.store(true, Ordering::SeqCst);
                            connected_device.store(Arc::new(Some(name)));
                        }
                        Err(e) => warn!("MIDI input connect failed: {}", e),
                    }
                }
                Ok(InputCommand::Disconnect) => {
                    if connection.take().is_some() {
                        is_connected.store(false, Ordering::SeqCst);
                        connected_device.store(Arc::new(None));
                    }
                }
                Ok(InputCommand::Shutdown) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn connect_to_device(
        device_index: usize,
        handler: InputHandler,
    ) -> Result<(MidiInputConnection<()>, String)> {
        let midi_input = MidiInput::new(CLIENT_NAME)?;

        let ports = midi_input.ports();
        let port = ports.get(device_index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI input device {} not found", device_index))
        })?;

        let port_name = midi_input
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", device_index));

        let connection = midi_input.connect(
            port,
            CLIENT_NAME,
            move |_timestamp, bytes, _| match InputMessage::from_bytes(bytes) {
                Ok(message) => handler(message),
                Err(e) => debug!("Ignoring MIDI input: {}", e),
            },
            (),
        )?;

        Ok((connection, port_name))
    }

    pub fn list_devices() -> Vec<MidiInputDevice> {
        let mut devices = Vec::new();
        if let Ok(midi_input) = MidiInput::new("cueflow-device-list") {
            for (index, port) in midi_input.ports().iter().enumerate() {
                let name = midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(MidiInputDevice { index, name });
            }
        }
        devices
    }

    pub fn connect(&self, device_index: usize, handler: InputHandler) -> Result<()> {
        self.command_sender
            .send(InputCommand::Connect(device_index, handler))
            .map_err(|_| Error::MidiDevice("MIDI input thread not running".to_string()))
    }

    /// Case-insensitive partial match on the port name.
    pub fn connect_by_name(&self, name: &str, handler: InputHandler) -> Result<()> {
        let needle = name.to_lowercase();
        let device = Self::list_devices()
            .into_iter()
            .find(|d| d.name.to_lowercase().contains(&needle))
            .ok_or_else(|| {
                Error::MidiDevice(format!("No MIDI input device found matching '{}'", name))
            })?;
        self.connect(device.index, handler)
    }

    pub fn disconnect(&self) {
        let _ = self.command_sender.send(InputCommand::Disconnect);
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub fn connected_device_name(&self) -> Option<String> {
        self.connected_device.load().as_ref().clone()
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(InputCommand::Shutdown);
    }
}
