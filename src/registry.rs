//! The in-memory control model and how it is built from, and kept in sync
//! with, the device.
//!
//! [`RegistryBuilder`] walks the device's controls once, drops the ones the
//! operator cannot or should not touch, and appends a synthesized `fps`
//! entry. After that the registry only ever changes values in place;
//! [`write_back`] pushes a changed value to the hardware.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::error::{CameraCtlError, Result};
use crate::filter::CodecFilterPolicy;
use crate::names;
use crate::port::{ControlInfo, ControlType, DeviceControlPort, FourCc, MenuItem, StreamFormat};
use crate::protocol::{FPS_CEILING_MAX, FPS_DEFAULT, FPS_ENTRY_ID};

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// What kind of parameter a descriptor represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Boolean,
    Integer,
    Menu,
    IntegerMenu,
    /// A negotiated stream setting (frame rate), not an addressable control.
    StreamParameter,
}

impl From<ControlType> for ControlKind {
    fn from(value: ControlType) -> Self {
        match value {
            ControlType::Boolean => Self::Boolean,
            ControlType::Menu => Self::Menu,
            ControlType::IntegerMenu => Self::IntegerMenu,
            // Anything else that answered VIDIOC_G_CTRL behaves as a plain integer.
            ControlType::Integer | ControlType::Unknown(_) => Self::Integer,
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "bool"),
            Self::Integer => write!(f, "int"),
            Self::Menu => write!(f, "menu"),
            Self::IntegerMenu => write!(f, "intmenu"),
            Self::StreamParameter => write!(f, "param"),
        }
    }
}

/// One entry of a menu or integer-menu control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub index: i32,
    pub item: MenuItem,
}

/// One adjustable parameter.
///
/// The value is private so every change goes through [`set_value`](Self::set_value),
/// which keeps it inside `[minimum, maximum]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub id: u32,
    pub display_name: String,
    pub variable_name: String,
    pub kind: ControlKind,
    value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
    pub options: Vec<MenuOption>,
}

/// Clamp without panicking on an inverted range (menus may report one).
fn clamp(value: i32, minimum: i32, maximum: i32) -> i32 {
    if value < minimum {
        minimum
    } else if value > maximum {
        maximum
    } else {
        value
    }
}

impl ControlDescriptor {
    /// Descriptor for a device control, holding the value the device reported.
    pub fn from_device(info: ControlInfo, variable_name: String, value: i32, options: Vec<MenuOption>) -> Self {
        Self {
            id: info.id,
            display_name: info.name,
            variable_name,
            kind: ControlKind::from(info.control_type),
            value,
            minimum: info.minimum,
            maximum: info.maximum,
            step: info.step,
            default_value: clamp(info.default_value, info.minimum, info.maximum),
            options,
        }
    }

    /// The synthesized frame-rate entry.
    pub fn frame_rate(current_fps: i32, ceiling: FpsCeiling) -> Self {
        Self {
            id: FPS_ENTRY_ID,
            display_name: "FPS".to_string(),
            variable_name: "fps".to_string(),
            kind: ControlKind::StreamParameter,
            value: current_fps,
            minimum: 1,
            maximum: ceiling.get(),
            step: 1,
            default_value: clamp(FPS_DEFAULT, 1, ceiling.get()),
            options: Vec::new(),
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Set the value, clamped to the control's range. Returns whether it changed.
    pub fn set_value(&mut self, value: i32) -> bool {
        let clamped = clamp(value, self.minimum, self.maximum);
        let changed = clamped != self.value;
        self.value = clamped;
        changed
    }

    pub fn is_stream_parameter(&self) -> bool {
        self.kind == ControlKind::StreamParameter
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default_value
    }

    /// Where the value sits relative to the default.
    pub fn deviation(&self) -> Ordering {
        self.value.cmp(&self.default_value)
    }

    /// The menu option whose index equals the current value.
    pub fn current_option(&self) -> Option<&MenuOption> {
        self.options.iter().find(|option| option.index == self.value)
    }

    /// Value as shown to the operator: the option label for menus, else the number.
    pub fn display_value(&self) -> String {
        match self.current_option() {
            Some(option) => option.item.to_string(),
            None => self.value.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered collection of descriptors, in discovery order, with lookup by name.
#[derive(Debug, Clone, Default)]
pub struct ControlRegistry {
    format: StreamFormat,
    controls: Vec<ControlDescriptor>,
    by_name: HashMap<String, usize>,
}

impl ControlRegistry {
    pub fn new(format: StreamFormat) -> Self {
        Self { format, ..Self::default() }
    }

    /// Append a descriptor. A variable name that is already taken gets a
    /// numeric suffix so names stay unique.
    pub fn push(&mut self, mut control: ControlDescriptor) {
        if self.by_name.contains_key(&control.variable_name) {
            let base = control.variable_name.clone();
            let mut n = 2;
            while self.by_name.contains_key(&format!("{}_{}", base, n)) {
                n += 1;
            }
            control.variable_name = format!("{}_{}", base, n);
            debug!(control = %control.display_name, from = %base, to = %control.variable_name, "Renamed duplicate variable");
        }
        self.by_name.insert(control.variable_name.clone(), self.controls.len());
        self.controls.push(control);
    }

    /// The capture format the registry was built against.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ControlDescriptor> {
        self.controls.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut ControlDescriptor> {
        self.controls.get_mut(index)
    }

    pub fn position(&self, variable_name: &str) -> Option<usize> {
        self.by_name.get(variable_name).copied()
    }

    pub fn find(&self, variable_name: &str) -> Option<&ControlDescriptor> {
        self.position(variable_name).and_then(|i| self.controls.get(i))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ControlDescriptor> {
        self.controls.iter()
    }

    pub fn as_slice(&self) -> &[ControlDescriptor] {
        &self.controls
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, ControlDescriptor> {
        self.controls.iter_mut()
    }

    /// Re-read every discrete control from the device. Controls that fail to
    /// read keep their value. Returns how many values changed.
    pub fn refresh<P: DeviceControlPort + ?Sized>(&mut self, port: &mut P) -> usize {
        let mut changed = 0;
        for control in self.controls.iter_mut().filter(|c| !c.is_stream_parameter()) {
            match port.get_value(control.id) {
                Ok(value) => {
                    if control.set_value(value) {
                        changed += 1;
                    }
                }
                Err(e) => debug!(control = %control.display_name, error = %e, "Refresh read failed"),
            }
        }
        changed
    }
}

impl<'a> IntoIterator for &'a ControlRegistry {
    type Item = &'a ControlDescriptor;
    type IntoIter = std::slice::Iter<'a, ControlDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.controls.iter()
    }
}

// ---------------------------------------------------------------------------
// Write-back
// ---------------------------------------------------------------------------

/// Push a descriptor's value to the device, best effort.
///
/// A rejected discrete write is logged and the in-memory value kept. For the
/// frame-rate entry the device may settle on a different rate than requested;
/// the descriptor then takes the achieved rate.
pub fn write_back<P: DeviceControlPort + ?Sized>(port: &mut P, control: &mut ControlDescriptor) {
    match control.kind {
        ControlKind::StreamParameter => match port.set_frame_rate(control.value) {
            Ok(achieved) => {
                if achieved != control.value {
                    debug!(requested = control.value, achieved, "Device adjusted frame rate");
                }
                control.set_value(achieved);
            }
            Err(e) => debug!(error = %e, "Frame rate write failed"),
        },
        _ => {
            if let Err(e) = port.set_value(control.id, control.value) {
                debug!(control = %control.display_name, error = %e, "Control write rejected");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Variable names excluded from the registry, matched by prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet(Vec<String>);

impl IgnoreSet {
    /// Whether `variable_name` starts with any ignored entry.
    pub fn matches(&self, variable_name: &str) -> bool {
        self.0.iter().any(|entry| variable_name.starts_with(entry.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).filter(|s: &String| !s.is_empty()).collect())
    }
}

/// Upper bound of the frame-rate entry, 1 to 120.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpsCeiling(i32);

impl FpsCeiling {
    pub fn new(fps: i32) -> Result<Self> {
        if (1..=FPS_CEILING_MAX).contains(&fps) {
            Ok(Self(fps))
        } else {
            Err(CameraCtlError::InvalidArgument {
                arg: "-f",
                value: fps.to_string(),
                valid: "1 to 120",
            })
        }
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl Default for FpsCeiling {
    fn default() -> Self {
        Self(FPS_DEFAULT)
    }
}

impl std::str::FromStr for FpsCeiling {
    type Err = CameraCtlError;

    fn from_str(s: &str) -> Result<Self> {
        let fps = s.trim().parse::<i32>().map_err(|_| CameraCtlError::InvalidArgument {
            arg: "-f",
            value: s.to_string(),
            valid: "1 to 120",
        })?;
        Self::new(fps)
    }
}

/// A control found during discovery, before ignore rules apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlListing {
    pub variable_name: String,
    pub display_name: String,
}

/// Enumerates the device and assembles a [`ControlRegistry`].
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    filter: CodecFilterPolicy,
    ignore: IgnoreSet,
    fps_ceiling: FpsCeiling,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_filtering(mut self, strict: bool) -> Self {
        self.filter = CodecFilterPolicy::new(strict);
        self
    }

    pub fn ignore(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn fps_ceiling(mut self, ceiling: FpsCeiling) -> Self {
        self.fps_ceiling = ceiling;
        self
    }

    /// Build the registry. Fails only if the format query fails; controls
    /// that cannot be read are skipped.
    pub fn build<P: DeviceControlPort>(&self, port: &mut P) -> Result<ControlRegistry> {
        let format = port.query_format()?;
        let mut registry = ControlRegistry::new(format);

        self.discover(port, format.pixel_format, |port, info, value, variable_name| {
            if self.ignore.matches(&variable_name) {
                info!(control = %info.name, variable = %variable_name, "Ignoring control");
                return;
            }
            let options = if info.control_type.has_menu() {
                collect_options(port, &info)
            } else {
                Vec::new()
            };
            registry.push(ControlDescriptor::from_device(info, variable_name, value, options));
        });

        let fps = port.frame_rate().unwrap_or_else(|e| {
            debug!(error = %e, "Frame rate query failed");
            0
        });
        registry.push(ControlDescriptor::frame_rate(fps, self.fps_ceiling));

        info!(controls = registry.len(), "Control registry built");
        Ok(registry)
    }

    /// Discover controls without building a registry; ignore rules are not
    /// applied so the listing shows every name that could be ignored.
    pub fn list<P: DeviceControlPort>(&self, port: &mut P) -> Result<Vec<ControlListing>> {
        let format = port.query_format()?;
        let mut listing = Vec::new();
        self.discover(port, format.pixel_format, |_, info, _, variable_name| {
            listing.push(ControlListing { variable_name, display_name: info.name });
        });
        Ok(listing)
    }

    /// Walk the device, handing every adjustable, relevant, readable control
    /// to `visit` along with its current value and variable name.
    fn discover<P, F>(&self, port: &mut P, format: FourCc, mut visit: F)
    where
        P: DeviceControlPort,
        F: FnMut(&mut P, ControlInfo, i32, String),
    {
        let mut controls = port.controls();
        while let Some(info) = controls.next() {
            if !info.is_adjustable() {
                debug!(control = %info.name, flags = info.flags, "Skipping non-adjustable control");
                continue;
            }
            if !self.filter.allows(info.id, format) {
                info!(control = %info.name, "Ignore unsupported control");
                continue;
            }

            let port = controls.port();
            let value = match port.get_value(info.id) {
                Ok(value) => value,
                Err(e) => {
                    debug!(control = %info.name, error = %e, "Skipping unreadable control");
                    continue;
                }
            };

            let variable_name = names::normalize(&info.name);
            visit(port, info, value, variable_name);
        }
    }
}

/// Query every menu index in range; indices the device rejects are left out.
fn collect_options<P: DeviceControlPort>(port: &mut P, info: &ControlInfo) -> Vec<MenuOption> {
    if info.maximum < info.minimum {
        return Vec::new();
    }
    (info.minimum..=info.maximum)
        .filter_map(|index| {
            port.query_menu(info, index)
                .ok()
                .map(|item| MenuOption { index, item })
        })
        .collect()
}
