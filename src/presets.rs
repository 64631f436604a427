//! Preset files: up to nine config files selectable by number.
//!
//! In numeric order a file claims the slot named by its leading digit
//! (`3-Indoor` is preset 3, shown as "Indoor"). In alphabetical order the
//! first nine files take the slots sorted by name.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CameraCtlError, Result};
use crate::persist;
use crate::port::DeviceControlPort;
use crate::registry::ControlRegistry;

pub const PRESET_SLOTS: usize = 9;

/// How files are assigned to slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresetOrder {
    #[default]
    Numeric,
    Alphabetical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    /// Zero-based slot; shown to the operator as `slot + 1`.
    pub slot: usize,
    pub path: PathBuf,
    pub name: String,
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.slot + 1, self.name)
    }
}

/// Outcome of loading one preset.
#[derive(Debug)]
pub struct PresetLoad {
    pub slot: usize,
    pub path: PathBuf,
    /// Applied record count, or why the file could not be read.
    pub result: Result<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    slots: [Option<Preset>; PRESET_SLOTS],
    last_loaded: Option<usize>,
}

impl PresetCatalog {
    /// Scan `dir` (not recursively). Entries are visited in file-name order,
    /// so when two files claim the same slot the later name wins.
    pub fn scan(dir: &Path, order: PresetOrder) -> Result<Self> {
        let file_error = |source| CameraCtlError::File {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(file_error)? {
            let entry = entry.map_err(file_error)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            files.push((file_name, path));
        }
        files.sort();

        let catalog = Self::from_files(files, order);
        info!(dir = %dir.display(), presets = catalog.len(), ?order, "Scanned presets");
        Ok(catalog)
    }

    /// Assign `(file name, path)` pairs to slots, in the order given.
    pub fn from_files<I>(files: I, order: PresetOrder) -> Self
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        let mut catalog = Self::default();
        match order {
            PresetOrder::Numeric => {
                for (file_name, path) in files {
                    let Some(slot) = numeric_slot(&file_name) else {
                        debug!(file = %file_name, "Not a numbered preset");
                        continue;
                    };
                    let name = file_name[1..]
                        .trim_start_matches(|c: char| !c.is_ascii_alphanumeric())
                        .to_string();
                    catalog.slots[slot] = Some(Preset { slot, path, name });
                }
            }
            PresetOrder::Alphabetical => {
                let mut taken: Vec<(String, PathBuf)> = files.into_iter().take(PRESET_SLOTS).collect();
                taken.sort_by(|a, b| a.0.cmp(&b.0));
                for (slot, (name, path)) in taken.into_iter().enumerate() {
                    catalog.slots[slot] = Some(Preset { slot, path, name });
                }
            }
        }
        catalog
    }

    pub fn get(&self, slot: usize) -> Option<&Preset> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Populated slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_loaded(&self) -> Option<usize> {
        self.last_loaded
    }

    /// Slot `load_next` would pick: the first populated slot after the last
    /// loaded one, wrapping to the start.
    pub fn next_slot(&self) -> Option<usize> {
        let populated = |slot: &usize| self.slots[*slot].is_some();
        match self.last_loaded {
            None => (0..PRESET_SLOTS).find(populated),
            Some(last) => (last + 1..PRESET_SLOTS).chain(0..=last).find(populated),
        }
    }

    /// Load the preset in `slot`, if there is one, and remember it as the
    /// last loaded even when the file turns out to be unreadable.
    pub fn load_slot<P: DeviceControlPort + ?Sized>(
        &mut self,
        slot: usize,
        registry: &mut ControlRegistry,
        port: &mut P,
    ) -> Option<PresetLoad> {
        let path = self.get(slot)?.path.clone();
        let result = persist::load(registry, port, &path);
        self.last_loaded = Some(slot);
        Some(PresetLoad { slot, path, result })
    }

    /// Load the next populated preset; nothing happens when there is none.
    pub fn load_next<P: DeviceControlPort + ?Sized>(
        &mut self,
        registry: &mut ControlRegistry,
        port: &mut P,
    ) -> Option<PresetLoad> {
        let slot = self.next_slot()?;
        self.load_slot(slot, registry, port)
    }
}

/// Slot claimed by a leading `1`..`9`.
fn numeric_slot(file_name: &str) -> Option<usize> {
    match file_name.as_bytes().first() {
        Some(digit @ b'1'..=b'9') => Some(usize::from(digit - b'1')),
        _ => None,
    }
}
