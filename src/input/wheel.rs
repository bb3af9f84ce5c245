//! Wheel smoothing: per-axis deadzone with axis lock, and unit quantization
//!
//! Touchpads report small scroll deltas on both axes at once. The first axis
//! whose accumulated delta leaves the deadzone is locked, and events on the
//! other axis are discarded until scrolling pauses. Deltas are then split into
//! a continuous `scale` and a whole number of `units` for commands that can
//! only step.

use std::time::{Duration, Instant};

use crate::keymap::KeyCode;

/// Scroll distance that must accumulate before an axis registers
pub const DEADZONE_DIST: f64 = 0.125;
/// Inactivity after which the deadzone and axis lock reset
pub const DEADZONE_SCROLL_TIME: Duration = Duration::from_millis(200);
/// Inactivity after which partial units are forgotten
pub const UNIT_SCROLL_TIME: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelAxisState {
    pub dead_zone_accum: f64,
    pub unit_accum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Vertical,
    Horizontal,
}

#[derive(Debug, Default)]
pub struct WheelShaper {
    vertical: WheelAxisState,
    horizontal: WheelAxisState,
    locked: Option<Axis>,
    last_event: Option<Instant>,
}

impl WheelShaper {
    pub fn new() -> Self {
        Self::default()
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut WheelAxisState {
        match axis {
            Axis::Vertical => &mut self.vertical,
            Axis::Horizontal => &mut self.horizontal,
        }
    }

    /// Shape one wheel event.
    ///
    /// `direction` must be one of the wheel keys (modifiers are ignored).
    /// Returns the effective `(scale, units)` or None if the event is
    /// discarded. Non-wheel keys pass through unchanged as `(raw_scale, 1)`.
    pub fn process(
        &mut self,
        direction: KeyCode,
        raw_scale: f64,
        now: Instant,
    ) -> Option<(f64, u32)> {
        let base = direction.base();
        let (sign, axis) = if base == KeyCode::WHEEL_UP {
            (-1.0, Axis::Vertical)
        } else if base == KeyCode::WHEEL_DOWN {
            (1.0, Axis::Vertical)
        } else if base == KeyCode::WHEEL_LEFT {
            (-1.0, Axis::Horizontal)
        } else if base == KeyCode::WHEEL_RIGHT {
            (1.0, Axis::Horizontal)
        } else {
            return Some((raw_scale, 1));
        };

        if let Some(last) = self.last_event {
            let idle = now.saturating_duration_since(last);
            if idle > DEADZONE_SCROLL_TIME {
                self.locked = None;
                self.vertical.dead_zone_accum = 0.0;
                self.horizontal.dead_zone_accum = 0.0;
            }
            if idle > UNIT_SCROLL_TIME {
                self.vertical.unit_accum = 0.0;
                self.horizontal.unit_accum = 0.0;
            }
        }
        self.last_event = Some(now);

        let mut scale = raw_scale;
        if self.locked.is_none() {
            let state = self.axis_mut(axis);
            state.dead_zone_accum += raw_scale * sign;
            if state.dead_zone_accum * sign > DEADZONE_DIST {
                scale = state.dead_zone_accum * sign;
                self.locked = Some(axis);
            }
        }
        if self.locked != Some(axis) {
            return None;
        }

        let state = self.axis_mut(axis);
        state.unit_accum += scale * sign;
        let units = (state.unit_accum * sign).trunc();
        state.unit_accum -= units * sign;
        Some((scale, units.max(0.0) as u32))
    }

    pub fn locked_axis_is_vertical(&self) -> Option<bool> {
        self.locked.map(|axis| axis == Axis::Vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_steps_do_not_lock() {
        let mut wheel = WheelShaper::new();
        let now = Instant::now();
        assert_eq!(wheel.process(KeyCode::WHEEL_UP, 0.05, now), None);
        assert_eq!(wheel.process(KeyCode::WHEEL_UP, 0.05, now), None);
        assert_eq!(wheel.locked_axis_is_vertical(), None);

        // 0.15 accumulated, breaks out of the deadzone
        let (scale, units) = wheel.process(KeyCode::WHEEL_UP, 0.05, now).unwrap();
        assert!((scale - 0.15).abs() < 1e-9);
        assert_eq!(units, 0);
        assert_eq!(wheel.locked_axis_is_vertical(), Some(true));
    }

    #[test]
    fn test_lock_discards_other_axis() {
        let mut wheel = WheelShaper::new();
        let now = Instant::now();
        assert!(wheel.process(KeyCode::WHEEL_DOWN, 1.0, now).is_some());
        assert_eq!(wheel.process(KeyCode::WHEEL_LEFT, 1.0, now), None);
        assert_eq!(wheel.process(KeyCode::WHEEL_RIGHT, 5.0, now), None);

        let later = now + DEADZONE_SCROLL_TIME + Duration::from_millis(1);
        assert!(wheel.process(KeyCode::WHEEL_RIGHT, 1.0, later).is_some());
        assert_eq!(wheel.locked_axis_is_vertical(), Some(false));
    }

    #[test]
    fn test_unit_quantization_carries_remainder() {
        let mut wheel = WheelShaper::new();
        let now = Instant::now();
        let mut total = 0;
        let mut accumulated = 0.0;
        for _ in 0..10 {
            let (scale, units) = wheel.process(KeyCode::WHEEL_DOWN, 0.5, now).unwrap();
            accumulated += scale;
            total += units;
            assert_eq!(total, (accumulated + 1e-9).floor() as u32);
        }
        assert_eq!(total, 5);
    }

    #[test]
    fn test_unit_quantization_whole_steps() {
        let mut wheel = WheelShaper::new();
        let now = Instant::now();
        let units: Vec<u32> = (0..10)
            .map(|_| wheel.process(KeyCode::WHEEL_DOWN, 1.0, now).unwrap().1)
            .collect();
        assert_eq!(units, vec![1; 10]);
    }

    #[test]
    fn test_unit_reset_after_idle() {
        let mut wheel = WheelShaper::new();
        let now = Instant::now();
        assert_eq!(wheel.process(KeyCode::WHEEL_UP, 0.6, now).unwrap().1, 0);
        let later = now + UNIT_SCROLL_TIME + Duration::from_millis(1);
        // Partial unit was dropped, so 0.6 again stays below one unit
        assert_eq!(wheel.process(KeyCode::WHEEL_UP, 0.6, later).unwrap().1, 0);
        assert_eq!(wheel.process(KeyCode::WHEEL_UP, 0.6, later).unwrap().1, 1);
    }

    #[test]
    fn test_non_wheel_key_passes_through() {
        let mut wheel = WheelShaper::new();
        let now = Instant::now();
        assert_eq!(wheel.process(KeyCode::char('a'), 2.5, now), Some((2.5, 1)));
    }
}
