//! Value transitions on the active control and list navigation.

use tracing::debug;

use crate::port::DeviceControlPort;
use crate::registry::{write_back, ControlDescriptor, ControlRegistry};

/// Steps per jump (page up / page down).
const JUMP_STEPS: i32 = 10;

/// A bounded change to one control's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    StepDown,
    StepUp,
    JumpDown,
    JumpUp,
    ToMinimum,
    ToMaximum,
    ToDefault,
}

impl Transition {
    /// Unclamped value this transition aims for.
    fn target(self, control: &ControlDescriptor) -> i32 {
        let value = control.value();
        let jump = control.step.saturating_mul(JUMP_STEPS);
        match self {
            Self::StepDown => value.saturating_sub(control.step),
            Self::StepUp => value.saturating_add(control.step),
            Self::JumpDown => value.saturating_sub(jump),
            Self::JumpUp => value.saturating_add(jump),
            Self::ToMinimum => control.minimum,
            Self::ToMaximum => control.maximum,
            Self::ToDefault => control.default_value,
        }
    }
}

/// Apply `transition` to the control at `index`.
///
/// The new value is clamped to the control's range. Only when it differs
/// from the old one is the device written; the return value says whether
/// anything changed.
pub fn apply<P: DeviceControlPort + ?Sized>(
    registry: &mut ControlRegistry,
    port: &mut P,
    index: usize,
    transition: Transition,
) -> bool {
    let Some(control) = registry.get_mut(index) else {
        return false;
    };
    let before = control.value();
    let target = transition.target(control);
    if !control.set_value(target) {
        return false;
    }
    debug!(control = %control.variable_name, value = control.value(), ?transition, "Adjusted");
    write_back(port, control);
    // The device may settle a stream parameter back on the old value.
    control.value() != before
}

/// Put every control back to its default and write each one to the device.
/// Returns how many values changed.
pub fn reset_all<P: DeviceControlPort + ?Sized>(registry: &mut ControlRegistry, port: &mut P) -> usize {
    let mut changed = 0;
    for control in registry.iter_mut() {
        let default = control.default_value;
        if control.set_value(default) {
            changed += 1;
        }
        write_back(port, control);
    }
    changed
}

/// Movement of the active row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
    First,
    Last,
}

/// New active index after `navigation`, kept within `[0, count - 1]`.
pub fn navigate(active: usize, count: usize, navigation: Navigation) -> usize {
    let last = count.saturating_sub(1);
    let next = match navigation {
        Navigation::Previous => active.saturating_sub(1),
        Navigation::Next => active.saturating_add(1),
        Navigation::First => 0,
        Navigation::Last => last,
    };
    next.min(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::fake::FakePort;
    use crate::registry::RegistryBuilder;

    const GAIN: u32 = 0x0098_0913;
    const ZOOM: u32 = 0x009a_090d;

    fn setup() -> (ControlRegistry, FakePort) {
        let mut port = FakePort::new()
            .with_integer(GAIN, "Gain", (0, 100, 5), 50, 50)
            .with_integer(ZOOM, "Zoom, Absolute", (100, 500, 1), 100, 100);
        let registry = RegistryBuilder::new().build(&mut port).unwrap();
        port.writes.clear();
        (registry, port)
    }

    #[test]
    fn step_up_then_down_returns() {
        let (mut registry, mut port) = setup();
        assert!(apply(&mut registry, &mut port, 0, Transition::StepUp));
        assert_eq!(registry.get(0).unwrap().value(), 55);
        assert!(apply(&mut registry, &mut port, 0, Transition::StepDown));
        assert_eq!(registry.get(0).unwrap().value(), 50);
        assert_eq!(port.writes, [(GAIN, 55), (GAIN, 50)]);
    }

    #[test]
    fn no_op_at_boundary_skips_device() {
        let (mut registry, mut port) = setup();
        assert!(apply(&mut registry, &mut port, 0, Transition::ToMaximum));
        port.writes.clear();

        assert!(!apply(&mut registry, &mut port, 0, Transition::StepUp));
        assert!(!apply(&mut registry, &mut port, 0, Transition::JumpUp));
        assert!(port.writes.is_empty());
        assert_eq!(registry.get(0).unwrap().value(), 100);
    }

    #[test]
    fn jumps_clamp_instead_of_wrapping() {
        let (mut registry, mut port) = setup();
        assert!(apply(&mut registry, &mut port, 1, Transition::JumpUp));
        assert_eq!(registry.get(1).unwrap().value(), 110);
        assert!(apply(&mut registry, &mut port, 0, Transition::JumpDown));
        assert_eq!(registry.get(0).unwrap().value(), 0);
        assert!(apply(&mut registry, &mut port, 1, Transition::JumpDown));
        assert_eq!(registry.get(1).unwrap().value(), 100);
        assert!(!apply(&mut registry, &mut port, 1, Transition::JumpDown));
    }

    #[test]
    fn every_transition_stays_in_range() {
        let transitions = [
            Transition::StepDown,
            Transition::StepUp,
            Transition::JumpDown,
            Transition::JumpUp,
            Transition::ToMinimum,
            Transition::ToMaximum,
            Transition::ToDefault,
        ];
        let (mut registry, mut port) = setup();
        for _ in 0..30 {
            for transition in transitions {
                for index in 0..registry.len() {
                    apply(&mut registry, &mut port, index, transition);
                    let c = registry.get(index).unwrap();
                    assert!(c.minimum <= c.value() && c.value() <= c.maximum, "{:?} on {}", transition, c.variable_name);
                }
            }
        }
    }

    #[test]
    fn extreme_step_saturates() {
        let mut port = FakePort::new().with_integer(1, "Wide", (i32::MIN, i32::MAX, i32::MAX), 0, 0);
        let mut registry = RegistryBuilder::new().build(&mut port).unwrap();
        assert!(apply(&mut registry, &mut port, 0, Transition::JumpUp));
        assert_eq!(registry.get(0).unwrap().value(), i32::MAX);
        assert!(apply(&mut registry, &mut port, 0, Transition::ToMinimum));
        assert_eq!(registry.get(0).unwrap().value(), i32::MIN);
    }

    #[test]
    fn out_of_range_index_is_no_op() {
        let (mut registry, mut port) = setup();
        assert!(!apply(&mut registry, &mut port, 99, Transition::StepUp));
        assert!(port.writes.is_empty());
    }

    #[test]
    fn to_default_on_fps_negotiates() {
        let (mut registry, mut port) = setup();
        port.supported_fps = vec![15, 30];
        let fps = registry.position("fps").unwrap();

        assert!(apply(&mut registry, &mut port, fps, Transition::StepDown));
        assert_eq!(port.fps_requests, [29]);
        assert_eq!(registry.get(fps).unwrap().value(), 15);

        assert!(apply(&mut registry, &mut port, fps, Transition::ToDefault));
        assert_eq!(registry.get(fps).unwrap().value(), 30);
    }

    #[test]
    fn fps_settling_on_old_rate_is_unchanged() {
        let (mut registry, mut port) = setup();
        port.supported_fps = vec![30];
        let fps = registry.position("fps").unwrap();

        assert!(!apply(&mut registry, &mut port, fps, Transition::StepDown));
        assert_eq!(port.fps_requests, [29]);
        assert_eq!(registry.get(fps).unwrap().value(), 30);
    }

    #[test]
    fn reset_all_writes_every_control() {
        let (mut registry, mut port) = setup();
        apply(&mut registry, &mut port, 0, Transition::StepUp);
        port.writes.clear();

        assert_eq!(reset_all(&mut registry, &mut port), 1);
        assert!(registry.iter().all(|c| c.is_default()));
        assert_eq!(port.writes, [(GAIN, 50), (ZOOM, 100)]);
        assert_eq!(port.fps_requests, [30]);
    }

    #[test]
    fn navigation_clamps() {
        assert_eq!(navigate(0, 5, Navigation::Previous), 0);
        assert_eq!(navigate(2, 5, Navigation::Previous), 1);
        assert_eq!(navigate(4, 5, Navigation::Next), 4);
        assert_eq!(navigate(1, 5, Navigation::Next), 2);
        assert_eq!(navigate(3, 5, Navigation::First), 0);
        assert_eq!(navigate(0, 5, Navigation::Last), 4);
        assert_eq!(navigate(0, 0, Navigation::Next), 0);
    }
}
