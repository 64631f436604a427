//! Config and preset files.
//!
//! A file holds one `variable=value` record per line, CRLF terminated. Only
//! values that differ from the control's default are written, so an empty
//! or missing file means "everything at default".

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{CameraCtlError, Result};
use crate::port::DeviceControlPort;
use crate::registry::{write_back, ControlRegistry};

/// One `name=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub value: i32,
}

/// Parse file contents into records. Lines that are not `name=integer` are skipped.
pub fn parse_records(text: &str) -> Vec<Record> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let parsed = line.split_once('=').and_then(|(name, value)| {
                let name = name.trim();
                let value = value.trim().parse::<i32>().ok()?;
                (!name.is_empty()).then(|| Record { name: name.to_string(), value })
            });
            if parsed.is_none() {
                debug!(line, "Skipping malformed record");
            }
            parsed
        })
        .collect()
}

/// Serialize every non-default value.
pub fn render(registry: &ControlRegistry) -> String {
    registry
        .iter()
        .filter(|control| !control.is_default())
        .map(|control| format!("{}={}\r\n", control.variable_name, control.value()))
        .collect()
}

/// Write non-default values to `path`. Returns the number of records written.
pub fn save(registry: &ControlRegistry, path: &Path) -> Result<usize> {
    let text = render(registry);
    fs::write(path, &text).map_err(|source| CameraCtlError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let records = text.lines().count();
    info!(path = %path.display(), records, "Saved controls");
    Ok(records)
}

/// Apply the records in `path` to the registry and the device.
///
/// Unknown names are skipped. A record is applied only when it changes the
/// control's value; the return value counts those. If the file cannot be
/// read the registry is left untouched.
pub fn load<P: DeviceControlPort + ?Sized>(
    registry: &mut ControlRegistry,
    port: &mut P,
    path: &Path,
) -> Result<usize> {
    let bytes = fs::read(path).map_err(|source| CameraCtlError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let mut applied = 0;
    for record in parse_records(&text) {
        let Some(control) = registry.position(&record.name).and_then(|i| registry.get_mut(i)) else {
            debug!(name = %record.name, "Unknown control in file");
            continue;
        };
        if control.set_value(record.value) {
            write_back(port, control);
            applied += 1;
        }
    }
    info!(path = %path.display(), applied, "Loaded controls");
    Ok(applied)
}
