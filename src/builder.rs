//! Builder for configuring and constructing a [`Cueflow`] instance.

use crate::{Cueflow, Result};
use cueflow_core::{
    EngineConfig, Metronome, PatchChanger, PerformanceEngine, PerformanceNotifier, Setlist,
};
use cueflow_midi::MidiSink;
use std::sync::Arc;

#[cfg(feature = "midi-io")]
use cueflow_midi::{MidiInputManager, MidiOutputManager};

enum OutputTarget {
    Sink(Arc<dyn MidiSink>),
    #[cfg(feature = "midi-io")]
    DeviceIndex(usize),
    #[cfg(feature = "midi-io")]
    DeviceName(String),
}

enum InputTarget {
    #[cfg(feature = "midi-io")]
    DeviceIndex(usize),
    #[cfg(feature = "midi-io")]
    DeviceName(String),
}

/// Hardware ports are opted into explicitly: without `.output_*()` the
/// engine has nowhere to send and `build` fails; without `.input_*()` input
/// is fed by calling [`Cueflow::send`].
///
/// # Example
///
/// ```ignore
/// use cueflow::prelude::*;
///
/// let cueflow = Cueflow::builder(setlist)
///     .output_device_name("IAC")
///     .input_device_name("Keystation")
///     .build()?;
///
/// cueflow.advance();
/// ```
pub struct CueflowBuilder {
    setlist: Setlist,
    config: EngineConfig,
    output: Option<OutputTarget>,
    inputs: Vec<InputTarget>,
    metronome: Option<Arc<dyn Metronome>>,
    patch_changer: Option<Arc<dyn PatchChanger>>,
    notifier: Option<Arc<dyn PerformanceNotifier>>,
}

impl CueflowBuilder {
    pub fn new(setlist: Setlist) -> Self {
        Self {
            setlist,
            config: EngineConfig::default(),
            output: None,
            inputs: Vec::new(),
            metronome: None,
            patch_changer: None,
            notifier: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Send routed MIDI to a custom sink instead of a hardware port.
    pub fn sink(mut self, sink: Arc<dyn MidiSink>) -> Self {
        self.output = Some(OutputTarget::Sink(sink));
        self
    }

    #[cfg(feature = "midi-io")]
    pub fn output_device(mut self, index: usize) -> Self {
        self.output = Some(OutputTarget::DeviceIndex(index));
        self
    }

    /// Case-insensitive partial match on the port name.
    #[cfg(feature = "midi-io")]
    pub fn output_device_name(mut self, name: impl Into<String>) -> Self {
        self.output = Some(OutputTarget::DeviceName(name.into()));
        self
    }

    #[cfg(feature = "midi-io")]
    pub fn input_device(mut self, index: usize) -> Self {
        self.inputs.push(InputTarget::DeviceIndex(index));
        self
    }

    /// Case-insensitive partial match on the port name.
    #[cfg(feature = "midi-io")]
    pub fn input_device_name(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(InputTarget::DeviceName(name.into()));
        self
    }

    /// Default: a threaded metronome at the configured tempo.
    pub fn metronome(mut self, metronome: Arc<dyn Metronome>) -> Self {
        self.metronome = Some(metronome);
        self
    }

    pub fn patch_changer(mut self, patch_changer: Arc<dyn PatchChanger>) -> Self {
        self.patch_changer = Some(patch_changer);
        self
    }

    pub fn notifier(mut self, notifier: impl PerformanceNotifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    pub fn build(self) -> Result<Cueflow> {
        #[cfg(feature = "midi-io")]
        let mut output_manager = None;

        let sink: Arc<dyn MidiSink> = match self.output {
            Some(OutputTarget::Sink(sink)) => sink,
            #[cfg(feature = "midi-io")]
            Some(OutputTarget::DeviceIndex(index)) => {
                let manager = MidiOutputManager::new()?;
                manager.connect(index)?;
                output_manager = Some(manager.clone());
                Arc::new(manager)
            }
            #[cfg(feature = "midi-io")]
            Some(OutputTarget::DeviceName(name)) => {
                let manager = MidiOutputManager::new()?;
                manager.connect_by_name(&name)?;
                output_manager = Some(manager.clone());
                Arc::new(manager)
            }
            None => {
                return Err(cueflow_core::Error::InvalidConfig(
                    "no MIDI output configured".to_string(),
                )
                .into())
            }
        };

        let mut engine_builder = PerformanceEngine::builder(self.setlist)
            .config(self.config)
            .sink(sink);
        if let Some(metronome) = self.metronome {
            engine_builder = engine_builder.metronome(metronome);
        }
        if let Some(patch_changer) = self.patch_changer {
            engine_builder = engine_builder.patch_changer(patch_changer);
        }
        if let Some(notifier) = self.notifier {
            engine_builder = engine_builder.notifier(notifier);
        }
        let engine = engine_builder.build()?;

        #[cfg(feature = "midi-io")]
        let inputs = {
            let mut managers = Vec::with_capacity(self.inputs.len());
            for target in self.inputs {
                let manager = MidiInputManager::new()?;
                let target_engine = engine.clone();
                let handler: cueflow_midi::InputHandler =
                    Arc::new(move |message| target_engine.send(message));
                match target {
                    InputTarget::DeviceIndex(index) => manager.connect(index, handler)?,
                    InputTarget::DeviceName(name) => manager.connect_by_name(&name, handler)?,
                }
                managers.push(manager);
            }
            managers
        };
        #[cfg(not(feature = "midi-io"))]
        let _ = self.inputs;

        Ok(Cueflow {
            engine,
            #[cfg(feature = "midi-io")]
            output: output_manager,
            #[cfg(feature = "midi-io")]
            inputs,
        })
    }
}
