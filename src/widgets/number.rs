//! Range slider with an enable checkbox.
//!
//! The slider value only means something while the widget is enabled;
//! a disabled number never reaches the configuration.

use crate::colors::Rgb;

use super::listeners::{ListenerId, Listeners};

/// Most decimal places a slider supports; finer steps are not
/// representable as an f64.
pub const MAX_DECIMALS: u32 = 15;

/// `(new_value, old_value)`
pub type ChangeListener = dyn FnMut(f64, f64);
/// `(enabled, current_value)`
pub type ToggleListener = dyn FnMut(bool, f64);

#[derive(Debug)]
pub struct NumberOption {
    name: String,
    min: f64,
    max: f64,
    decimals: u32,
    value: f64,
    enabled: bool,
    color: Option<Rgb>,
    change_listeners: Listeners<ChangeListener>,
    toggle_listeners: Listeners<ToggleListener>,
}

impl NumberOption {
    /// `decimals` is the number of decimal places; the slider step is
    /// `10^-decimals`, capped at [`MAX_DECIMALS`]. Starts disabled, at
    /// `min`.
    pub fn new(name: &str, min: f64, max: f64, decimals: u32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            name: name.to_string(),
            min,
            max,
            decimals: decimals.min(MAX_DECIMALS),
            value: min,
            enabled: false,
            color: None,
            change_listeners: Listeners::new(),
            toggle_listeners: Listeners::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn step(&self) -> f64 {
        10f64.powi(-(self.decimals as i32))
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Value published to the configuration, if any.
    pub fn effective_value(&self) -> Option<f64> {
        self.enabled.then_some(self.value)
    }

    pub fn color(&self) -> Option<Rgb> {
        self.color
    }

    pub fn set_color(&mut self, color: Option<Rgb>) {
        self.color = color;
    }

    /// Resets the range; the value goes back to the new minimum.
    pub fn set_range(&mut self, min: f64, max: f64, decimals: u32) {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.min = min;
        self.max = max;
        self.decimals = decimals.min(MAX_DECIMALS);
        self.value = min;
    }

    /// Clamp to `[min, max]` and snap to the step grid anchored at `min`.
    pub fn normalize(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return self.min;
        }
        let clamped = raw.clamp(self.min, self.max);
        let step = self.step();
        let steps = ((clamped - self.min) / step).round();
        let scale = 10f64.powi(self.decimals as i32);
        let snapped = ((self.min + steps * step) * scale).round() / scale;
        snapped.clamp(self.min, self.max)
    }

    pub fn add_change_listener(&mut self, listener: Box<ChangeListener>) -> ListenerId {
        self.change_listeners.add(listener)
    }

    pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        self.change_listeners.remove(id)
    }

    pub fn add_toggle_listener(&mut self, listener: Box<ToggleListener>) -> ListenerId {
        self.toggle_listeners.add(listener)
    }

    pub fn remove_toggle_listener(&mut self, id: ListenerId) -> bool {
        self.toggle_listeners.remove(id)
    }

    /// Moves the slider. Change listeners fire only while enabled and
    /// only when the normalized value differs from the current one.
    pub fn set_value(&mut self, raw: f64) -> bool {
        let new = self.normalize(raw);
        if new == self.value {
            return false;
        }
        let old = self.value;
        self.value = new;
        if !self.enabled {
            return false;
        }
        for listener in self.change_listeners.iter_mut() {
            listener(new, old);
        }
        true
    }

    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        let value = self.value;
        for listener in self.toggle_listeners.iter_mut() {
            listener(enabled, value);
        }
        true
    }

    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_defaults() {
        let n = NumberOption::new("x", 0.0, 10.0, 1);
        assert!(!n.is_enabled());
        assert_eq!(n.value(), 0.0);
        assert_eq!(n.effective_value(), None);
        assert!((n.step() - 0.1).abs() < 1e-12);
        assert_eq!(NumberOption::new("y", 0.0, 10.0, 0).step(), 1.0);
    }

    #[test]
    fn test_decimals_capped() {
        let mut n = NumberOption::new("x", 0.0, 10.0, 400);
        assert_eq!(n.decimals(), MAX_DECIMALS);
        assert!(n.step() > 0.0);
        n.set_value(5.0);
        assert!((n.value() - 5.0).abs() < 1e-9);
        n.set_range(0.0, 10.0, u32::MAX);
        assert_eq!(n.decimals(), MAX_DECIMALS);
    }

    #[test]
    fn test_normalize_clamps_and_snaps() {
        let n = NumberOption::new("x", 0.0, 10.0, 1);
        assert_eq!(n.normalize(-3.0), 0.0);
        assert_eq!(n.normalize(12.0), 10.0);
        assert_eq!(n.normalize(5.04), 5.0);
        assert_eq!(n.normalize(5.06), 5.1);
        assert_eq!(n.normalize(f64::NAN), 0.0);

        let m = NumberOption::new("pages", 1.0, 4.0, 0);
        assert_eq!(m.normalize(2.6), 3.0);
    }

    #[test]
    fn test_change_listeners_only_while_enabled() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut n = NumberOption::new("x", 0.0, 10.0, 0);
        let sink = seen.clone();
        n.add_change_listener(Box::new(move |new, old| sink.borrow_mut().push((new, old))));

        assert!(!n.set_value(3.0));
        assert_eq!(n.value(), 3.0);
        n.set_enabled(true);
        assert!(n.set_value(5.0));
        assert!(!n.set_value(5.0));
        assert_eq!(*seen.borrow(), vec![(5.0, 3.0)]);
        assert_eq!(n.effective_value(), Some(5.0));
    }

    #[test]
    fn test_toggle_listeners_carry_value() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut n = NumberOption::new("x", 0.0, 10.0, 0);
        let sink = seen.clone();
        n.add_toggle_listener(Box::new(move |on, v| sink.borrow_mut().push((on, v))));
        n.set_value(4.0);
        assert!(n.toggle());
        assert!(!n.set_enabled(true));
        assert!(n.set_enabled(false));
        assert_eq!(*seen.borrow(), vec![(true, 4.0), (false, 4.0)]);
    }

    #[test]
    fn test_set_range_resets_value() {
        let mut n = NumberOption::new("x", 10.0, 0.0, 0);
        assert_eq!((n.min(), n.max()), (0.0, 10.0));
        n.set_value(7.0);
        n.set_range(2.0, 8.0, 2);
        assert_eq!(n.value(), 2.0);
        assert_eq!(n.decimals(), 2);
    }
}
