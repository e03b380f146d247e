//! Radio-style widgets: booleans, enumerations and choice groups.
//!
//! All three share one model, tagged by [`ChoiceKind`]. Every widget
//! starts with the wildcard "Any" option (value `None`) selected.

use crate::colors::Rgb;
use crate::config::ConfigValue;

use super::listeners::{ListenerId, Listeners};

/// Label of the wildcard option.
pub const ANY: &str = "Any";

/// `(new_value, old_value)`; `None` is the "Any" wildcard.
pub type SelectionListener = dyn FnMut(Option<&ConfigValue>, Option<&ConfigValue>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceKind {
    /// Preloaded with `True` and `False`.
    Boolean,
    Enum,
    /// Mutually exclusive variables; the group itself has no name.
    Group,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceEntry {
    pub label: String,
    pub value: Option<ConfigValue>,
    pub color: Option<Rgb>,
}

#[derive(Debug)]
pub struct ChoiceOption {
    kind: ChoiceKind,
    name: String,
    // index 0 is always "Any"
    entries: Vec<ChoiceEntry>,
    selected: usize,
    listeners: Listeners<SelectionListener>,
}

impl ChoiceOption {
    fn with_kind(kind: ChoiceKind, name: &str) -> Self {
        let mut widget = Self {
            kind,
            name: name.to_string(),
            entries: Vec::new(),
            selected: 0,
            listeners: Listeners::new(),
        };
        widget.add_option(ANY, None);
        widget
    }

    pub fn new_enum(name: &str) -> Self {
        Self::with_kind(ChoiceKind::Enum, name)
    }

    pub fn new_boolean(name: &str) -> Self {
        let mut widget = Self::with_kind(ChoiceKind::Boolean, name);
        widget.add_option("True", Some(ConfigValue::Bool(true)));
        widget.add_option("False", Some(ConfigValue::Bool(false)));
        widget
    }

    pub fn new_group() -> Self {
        Self::with_kind(ChoiceKind::Group, "")
    }

    pub fn kind(&self) -> ChoiceKind {
        self.kind
    }

    /// Displayed variable name; groups never show one.
    pub fn name(&self) -> Option<&str> {
        match self.kind {
            ChoiceKind::Group => None,
            _ => Some(&self.name),
        }
    }

    pub fn set_name(&mut self, name: &str) {
        if self.kind != ChoiceKind::Group {
            self.name = name.to_string();
        }
    }

    /// Adds an option unless one with the same label exists.
    /// Returns whether the option was added.
    pub fn add_option(&mut self, label: &str, value: Option<ConfigValue>) -> bool {
        if self.entries.iter().any(|e| e.label == label) {
            return false;
        }
        self.entries.push(ChoiceEntry {
            label: label.to_string(),
            value,
            color: None,
        });
        true
    }

    pub fn option(&self, label: &str) -> Option<&ChoiceEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Options in display order: declared values first, "Any" last.
    pub fn options(&self) -> impl Iterator<Item = &ChoiceEntry> {
        self.entries[1..].iter().chain(self.entries[..1].iter())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected(&self) -> &ChoiceEntry {
        &self.entries[self.selected]
    }

    pub fn selected_value(&self) -> Option<&ConfigValue> {
        self.entries[self.selected].value.as_ref()
    }

    /// Color of the selected option, shown on the widget itself.
    pub fn selected_color(&self) -> Option<Rgb> {
        self.entries[self.selected].color
    }

    pub fn add_selection_listener(&mut self, listener: Box<SelectionListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_selection_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Selects the option with `label`.
    ///
    /// Returns `true` when the selected value changed and listeners were
    /// notified; re-selecting the current value (or an unknown label) is
    /// a no-op.
    pub fn select_option(&mut self, label: &str) -> bool {
        let Some(idx) = self.entries.iter().position(|e| e.label == label) else {
            return false;
        };
        if self.entries[idx].value == self.entries[self.selected].value {
            return false;
        }
        let old = self.entries[self.selected].value.clone();
        self.selected = idx;
        let new = self.entries[idx].value.clone();
        for listener in self.listeners.iter_mut() {
            listener(new.as_ref(), old.as_ref());
        }
        true
    }

    pub fn set_color(&mut self, label: &str, color: Option<Rgb>) -> bool {
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => {
                entry.color = color;
                true
            }
            None => false,
        }
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut ChoiceEntry> {
        self.entries.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Seen = Rc<RefCell<Vec<(Option<ConfigValue>, Option<ConfigValue>)>>>;

    fn record(widget: &mut ChoiceOption) -> Seen {
        let seen: Seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        widget.add_selection_listener(Box::new(move |new: Option<&ConfigValue>, old: Option<&ConfigValue>| {
            sink.borrow_mut().push((new.cloned(), old.cloned()));
        }));
        seen
    }

    #[test]
    fn test_boolean_preloaded() {
        let b = ChoiceOption::new_boolean("flag");
        let labels: Vec<_> = b.options().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["True", "False", "Any"]);
        assert_eq!(b.selected().label, ANY);
        assert_eq!(b.selected_value(), None);
        assert_eq!(b.option("True").unwrap().value, Some(ConfigValue::Bool(true)));
    }

    #[test]
    fn test_add_option_idempotent() {
        let mut e = ChoiceOption::new_enum("font");
        assert!(e.add_option("serif", Some("serif".into())));
        assert!(!e.add_option("serif", Some("other".into())));
        assert!(!e.add_option(ANY, Some("x".into())));
        assert_eq!(e.len(), 2);
        assert_eq!(e.option("serif").unwrap().value, Some("serif".into()));
    }

    #[test]
    fn test_reselect_is_noop() {
        let mut b = ChoiceOption::new_boolean("flag");
        let seen = record(&mut b);
        assert!(b.select_option("True"));
        assert!(!b.select_option("True"));
        assert!(!b.select_option("missing"));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(b.selected().label, "True");
    }

    #[test]
    fn test_listener_receives_new_and_old() {
        let mut b = ChoiceOption::new_boolean("flag");
        let seen = record(&mut b);
        b.select_option("True");
        b.select_option("False");
        b.select_option(ANY);
        assert_eq!(
            *seen.borrow(),
            vec![
                (Some(true.into()), None),
                (Some(false.into()), Some(true.into())),
                (None, Some(false.into())),
            ]
        );
    }

    #[test]
    fn test_listeners_fire_in_order_and_can_be_removed() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut e = ChoiceOption::new_enum("font");
        e.add_option("serif", Some("serif".into()));
        e.add_option("sans", Some("sans".into()));
        let o1 = order.clone();
        let first = e.add_selection_listener(Box::new(move |_, _| o1.borrow_mut().push(1)));
        let o2 = order.clone();
        e.add_selection_listener(Box::new(move |_, _| o2.borrow_mut().push(2)));

        e.select_option("serif");
        assert!(e.remove_selection_listener(first));
        e.select_option("sans");
        assert_eq!(*order.borrow(), vec![1, 2, 2]);
    }

    #[test]
    fn test_group_name_suppressed() {
        let mut g = ChoiceOption::new_group();
        g.set_name("ignored");
        assert_eq!(g.name(), None);
        assert_eq!(g.kind(), ChoiceKind::Group);
        assert_eq!(ChoiceOption::new_enum("font").name(), Some("font"));
    }

    #[test]
    fn test_set_color() {
        let mut b = ChoiceOption::new_boolean("flag");
        let red = Rgb::new(255, 0, 0);
        assert!(b.set_color("True", Some(red)));
        assert!(!b.set_color("Maybe", Some(red)));
        assert_eq!(b.option("True").unwrap().color, Some(red));
        assert_eq!(b.selected_color(), None);
        b.select_option("True");
        assert_eq!(b.selected_color(), Some(red));
    }
}
