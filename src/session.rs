//! The interactive session: owns the device, the registry and the presets,
//! and turns input events into changes.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::adjust::{self, Navigation, Transition};
use crate::device::V4l2Device;
use crate::error::Result;
use crate::persist;
use crate::port::{DeviceControlPort, StreamFormat};
use crate::presets::{PresetCatalog, PresetLoad, PresetOrder};
use crate::registry::{ControlDescriptor, ControlRegistry, FpsCeiling, IgnoreSet, RegistryBuilder};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_DEVICE: &str = "/dev/video0";
pub const DEFAULT_CONFIG_FILE: &str = "/boot/camera.txt";

/// Runtime settings, filled in from the command line.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub device: PathBuf,
    pub config_file: PathBuf,
    pub preset_dir: Option<PathBuf>,
    pub preset_order: PresetOrder,
    /// Hide codec controls that do not apply to the negotiated format.
    pub strict: bool,
    pub fps_ceiling: FpsCeiling,
    /// Variable-name prefixes to leave out of the registry.
    pub ignore: Vec<String>,
    pub list_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            preset_dir: None,
            preset_order: PresetOrder::default(),
            strict: false,
            fps_ceiling: FpsCeiling::default(),
            ignore: Vec::new(),
            list_only: false,
        }
    }
}

impl SessionConfig {
    /// A registry builder carrying this configuration's filter settings.
    pub fn registry_builder(&self) -> RegistryBuilder {
        RegistryBuilder::new()
            .strict_filtering(self.strict)
            .ignore(self.ignore.iter().map(String::as_str).collect::<IgnoreSet>())
            .fps_ceiling(self.fps_ceiling)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Abstract input, independent of how keys are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    NavigatePrevious,
    NavigateNext,
    NavigateFirst,
    NavigateLast,
    StepDown,
    StepUp,
    JumpDown,
    JumpUp,
    ToMinimum,
    ToMaximum,
    ToDefault,
    ResetAll,
    /// Preset number as shown, 1 to 9.
    LoadPreset(u8),
    LoadNextPreset,
    LoadConfig,
    SaveConfig,
    RefreshFromDevice,
    /// Terminal geometry changed.
    Resize,
    Quit,
    Unrecognized,
}

/// What the caller should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Redraw,
    Unchanged,
    Quit,
}

impl EventOutcome {
    fn redraw_if(changed: bool) -> Self {
        if changed { Self::Redraw } else { Self::Unchanged }
    }
}

/// Device facts shown in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub device: PathBuf,
    pub format: StreamFormat,
    pub config_file: PathBuf,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session<P> {
    port: P,
    config: SessionConfig,
    registry: ControlRegistry,
    catalog: PresetCatalog,
    active: usize,
    status: Option<String>,
}

impl Session<V4l2Device> {
    /// Open the configured device and build a session on it.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let device = V4l2Device::open(&config.device)?;
        Self::new(device, config)
    }
}

impl<P: DeviceControlPort> Session<P> {
    /// Build the registry and scan presets. Only a failed format query is an
    /// error; an unreadable preset directory leaves the catalog empty.
    pub fn new(mut port: P, config: SessionConfig) -> Result<Self> {
        let registry = config.registry_builder().build(&mut port)?;

        let catalog = match &config.preset_dir {
            Some(dir) => PresetCatalog::scan(dir, config.preset_order).unwrap_or_else(|e| {
                warn!(error = %e, "Cannot read preset directory");
                PresetCatalog::default()
            }),
            None => PresetCatalog::default(),
        };

        Ok(Self {
            port,
            config,
            registry,
            catalog,
            active: 0,
            status: None,
        })
    }

    pub fn registry(&self) -> &ControlRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_control(&self) -> Option<&ControlDescriptor> {
        self.registry.get(self.active)
    }

    /// Result of the last load or save, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            device: self.config.device.clone(),
            format: self.registry.format(),
            config_file: self.config.config_file.clone(),
        }
    }

    /// Apply one event. At most one control is written, except for
    /// reset, load and refresh which touch the whole registry.
    pub fn handle_event(&mut self, event: InputEvent) -> EventOutcome {
        match event {
            InputEvent::NavigatePrevious => self.navigate(Navigation::Previous),
            InputEvent::NavigateNext => self.navigate(Navigation::Next),
            InputEvent::NavigateFirst => self.navigate(Navigation::First),
            InputEvent::NavigateLast => self.navigate(Navigation::Last),
            InputEvent::StepDown => self.adjust(Transition::StepDown),
            InputEvent::StepUp => self.adjust(Transition::StepUp),
            InputEvent::JumpDown => self.adjust(Transition::JumpDown),
            InputEvent::JumpUp => self.adjust(Transition::JumpUp),
            InputEvent::ToMinimum => self.adjust(Transition::ToMinimum),
            InputEvent::ToMaximum => self.adjust(Transition::ToMaximum),
            InputEvent::ToDefault => self.adjust(Transition::ToDefault),
            InputEvent::ResetAll => {
                adjust::reset_all(&mut self.registry, &mut self.port);
                EventOutcome::Redraw
            }
            InputEvent::LoadPreset(number) => {
                let Some(slot) = usize::from(number).checked_sub(1) else {
                    return EventOutcome::Unchanged;
                };
                let load = self.catalog.load_slot(slot, &mut self.registry, &mut self.port);
                self.preset_loaded(load)
            }
            InputEvent::LoadNextPreset => {
                let load = self.catalog.load_next(&mut self.registry, &mut self.port);
                self.preset_loaded(load)
            }
            InputEvent::LoadConfig => {
                let path = self.config.config_file.clone();
                let result = persist::load(&mut self.registry, &mut self.port, &path);
                self.report_load("Config", &path, result);
                EventOutcome::Redraw
            }
            InputEvent::SaveConfig => {
                let path = &self.config.config_file;
                self.status = Some(match persist::save(&self.registry, path) {
                    Ok(_) => format!("Config file {} saved", path.display()),
                    Err(e) => {
                        debug!(error = %e, "Save failed");
                        format!("Cannot save {}", path.display())
                    }
                });
                EventOutcome::Redraw
            }
            InputEvent::RefreshFromDevice => {
                let changed = self.registry.refresh(&mut self.port);
                info!(changed, "Refreshed from device");
                EventOutcome::Redraw
            }
            InputEvent::Resize => EventOutcome::Redraw,
            InputEvent::Quit => EventOutcome::Quit,
            InputEvent::Unrecognized => EventOutcome::Unchanged,
        }
    }

    fn navigate(&mut self, navigation: Navigation) -> EventOutcome {
        let next = adjust::navigate(self.active, self.registry.len(), navigation);
        let moved = next != self.active;
        self.active = next;
        EventOutcome::redraw_if(moved)
    }

    fn adjust(&mut self, transition: Transition) -> EventOutcome {
        let changed = adjust::apply(&mut self.registry, &mut self.port, self.active, transition);
        EventOutcome::redraw_if(changed)
    }

    fn preset_loaded(&mut self, load: Option<PresetLoad>) -> EventOutcome {
        match load {
            Some(load) => {
                self.report_load("Preset", &load.path, load.result);
                EventOutcome::Redraw
            }
            None => EventOutcome::Unchanged,
        }
    }

    fn report_load(&mut self, title: &str, path: &Path, result: Result<usize>) {
        self.status = Some(match result {
            Ok(_) => format!("{} file {} loaded", title, path.display()),
            Err(e) => {
                debug!(error = %e, "Load failed");
                format!("Cannot load {}", path.display())
            }
        });
    }
}
