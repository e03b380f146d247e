//! Dropdown-like select whose options carry their own background color.
//!
//! The selected option is shown on the trigger and hidden from the list
//! of alternatives. Expand/collapse is driven by [`SelectBoard::click`],
//! the single click handler shared by every select on the page.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::colors::Rgb;
use crate::config::ConfigValue;

use super::listeners::{ListenerId, Listeners};

static NEXT_SELECT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionId(usize);

impl OptionId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomOption {
    pub name: String,
    pub value: Option<ConfigValue>,
    pub color: Option<Rgb>,
    hidden: bool,
}

impl CustomOption {
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

/// `(new_option, previous_option)`
pub type SelectListener = dyn FnMut(&CustomOption, Option<&CustomOption>);

/// Where a click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The trigger (selected label) of a select.
    Trigger(SelectId),
    /// One of the alternatives listed by a select.
    Option(SelectId, OptionId),
    /// Anywhere else on the page.
    Elsewhere,
}

#[derive(Debug)]
pub struct CustomSelect {
    id: SelectId,
    options: Vec<CustomOption>,
    selected: Option<OptionId>,
    label: String,
    background: Option<Rgb>,
    expanded: bool,
    listeners: Listeners<SelectListener>,
}

impl CustomSelect {
    /// With a default name, that option is created and selected.
    pub fn new(default: Option<(&str, Option<ConfigValue>, Option<Rgb>)>) -> Self {
        let mut select = Self {
            id: SelectId(NEXT_SELECT_ID.fetch_add(1, Ordering::Relaxed)),
            options: Vec::new(),
            selected: None,
            label: String::new(),
            background: None,
            expanded: false,
            listeners: Listeners::new(),
        };
        if let Some((name, value, color)) = default {
            let id = select.add_option(name, value, color);
            select.select_option(id);
        }
        select
    }

    pub fn id(&self) -> SelectId {
        self.id
    }

    /// Appends an option without selecting it.
    pub fn add_option(&mut self, name: &str, value: Option<ConfigValue>, color: Option<Rgb>) -> OptionId {
        self.options.push(CustomOption {
            name: name.to_string(),
            value,
            color,
            hidden: false,
        });
        OptionId(self.options.len() - 1)
    }

    pub fn option(&self, id: OptionId) -> Option<&CustomOption> {
        self.options.get(id.0)
    }

    pub fn options(&self) -> &[CustomOption] {
        &self.options
    }

    pub fn find(&self, name: &str) -> Option<OptionId> {
        self.options.iter().position(|o| o.name == name).map(OptionId)
    }

    pub fn selected(&self) -> Option<OptionId> {
        self.selected
    }

    pub fn selected_option(&self) -> Option<&CustomOption> {
        self.selected.and_then(|id| self.options.get(id.0))
    }

    /// Text shown on the trigger.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Trigger background; follows the selected option's color.
    pub fn background(&self) -> Option<Rgb> {
        self.background
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Alternatives offered while expanded (never the selected option).
    pub fn alternatives(&self) -> impl Iterator<Item = (OptionId, &CustomOption)> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.hidden)
            .map(|(i, o)| (OptionId(i), o))
    }

    pub fn add_selection_listener(&mut self, listener: Box<SelectListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_selection_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Returns `true` if the selection changed.
    pub fn select_option(&mut self, id: OptionId) -> bool {
        if id.0 >= self.options.len() || self.selected == Some(id) {
            return false;
        }
        let prev = self.selected;
        if let Some(p) = prev {
            self.options[p.0].hidden = false;
        }
        self.options[id.0].hidden = true;
        self.selected = Some(id);
        self.label = self.options[id.0].name.clone();
        self.background = self.options[id.0].color;

        let new_option = &self.options[id.0];
        let prev_option = prev.map(|p| &self.options[p.0]);
        for listener in self.listeners.iter_mut() {
            listener(new_option, prev_option);
        }
        true
    }

    pub fn set_option_color(&mut self, id: OptionId, color: Option<Rgb>) -> bool {
        let Some(option) = self.options.get_mut(id.0) else {
            return false;
        };
        option.color = color;
        if self.selected == Some(id) {
            self.background = color;
        }
        true
    }

    pub fn expand(&mut self) {
        self.expanded = true;
    }

    pub fn collapse(&mut self) {
        self.expanded = false;
    }

    /// Page-wide click handler for this select.
    pub fn handle_click(&mut self, target: ClickTarget) {
        let on_trigger = target == ClickTarget::Trigger(self.id);
        if !on_trigger || self.expanded {
            self.collapse();
        } else {
            self.expand();
        }
    }
}

/// Every select living on one page, sharing one click handler.
#[derive(Debug, Default)]
pub struct SelectBoard {
    selects: Vec<CustomSelect>,
}

impl SelectBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a select, collapsed.
    pub fn add(&mut self, mut select: CustomSelect) -> SelectId {
        select.collapse();
        let id = select.id();
        self.selects.push(select);
        id
    }

    pub fn get(&self, id: SelectId) -> Option<&CustomSelect> {
        self.selects.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SelectId) -> Option<&mut CustomSelect> {
        self.selects.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomSelect> {
        self.selects.iter()
    }

    pub fn len(&self) -> usize {
        self.selects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selects.is_empty()
    }

    /// Dispatches a click: the clicked option (if any) is selected first,
    /// then every select runs its expand/collapse handler.
    pub fn click(&mut self, target: ClickTarget) {
        if let ClickTarget::Option(sid, oid) = target {
            if let Some(select) = self.get_mut(sid) {
                select.select_option(oid);
            }
        }
        for select in self.selects.iter_mut() {
            select.handle_click(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn three() -> (CustomSelect, OptionId, OptionId, OptionId) {
        let mut s = CustomSelect::new(None);
        let a = s.add_option("A", Some("a".into()), Some(Rgb::new(1, 1, 1)));
        let b = s.add_option("B", Some("b".into()), None);
        let c = s.add_option("C", None, None);
        (s, a, b, c)
    }

    fn hidden(s: &CustomSelect) -> Vec<OptionId> {
        s.options()
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_hidden())
            .map(|(i, _)| OptionId(i))
            .collect()
    }

    #[test]
    fn test_no_default_skips_selection() {
        let (s, ..) = three();
        assert_eq!(s.selected(), None);
        assert!(hidden(&s).is_empty());
        assert_eq!(s.label(), "");
    }

    #[test]
    fn test_default_is_selected() {
        let s = CustomSelect::new(Some(("Any", None, None)));
        assert_eq!(s.label(), "Any");
        assert_eq!(s.selected(), s.find("Any"));
    }

    #[test]
    fn test_exactly_one_hidden_after_select() {
        let (mut s, a, b, c) = three();
        for target in [a, b, c, a] {
            s.select_option(target);
            assert_eq!(hidden(&s), vec![target]);
            assert_eq!(s.selected(), Some(target));
            assert!(s.alternatives().all(|(id, _)| id != target));
        }
    }

    #[test]
    fn test_label_and_background_follow_selection() {
        let (mut s, a, b, _) = three();
        s.select_option(a);
        assert_eq!(s.label(), "A");
        assert_eq!(s.background(), Some(Rgb::new(1, 1, 1)));
        s.select_option(b);
        assert_eq!(s.background(), None);
        s.set_option_color(b, Some(Rgb::new(9, 9, 9)));
        assert_eq!(s.background(), Some(Rgb::new(9, 9, 9)));
    }

    #[test]
    fn test_reselect_is_noop_and_listeners_get_prev() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (mut s, a, b, _) = three();
        let sink = seen.clone();
        let id = s.add_selection_listener(Box::new(move |new: &CustomOption, prev: Option<&CustomOption>| {
            sink.borrow_mut()
                .push((new.name.clone(), prev.map(|p| p.name.clone())));
        }));
        assert!(s.select_option(a));
        assert!(!s.select_option(a));
        assert!(s.select_option(b));
        assert!(s.remove_selection_listener(id));
        assert!(s.select_option(a));
        assert_eq!(
            *seen.borrow(),
            vec![("A".to_string(), None), ("B".to_string(), Some("A".to_string()))]
        );
    }

    #[test]
    fn test_click_routing_is_per_select() {
        let mut board = SelectBoard::new();
        let (s1, _, b1, _) = three();
        let (s2, ..) = three();
        let id1 = board.add(s1);
        let id2 = board.add(s2);

        board.click(ClickTarget::Trigger(id1));
        assert!(board.get(id1).unwrap().is_expanded());
        assert!(!board.get(id2).unwrap().is_expanded());

        // opening the second closes the first
        board.click(ClickTarget::Trigger(id2));
        assert!(!board.get(id1).unwrap().is_expanded());
        assert!(board.get(id2).unwrap().is_expanded());

        // trigger again while expanded collapses
        board.click(ClickTarget::Trigger(id2));
        assert!(!board.get(id2).unwrap().is_expanded());

        board.click(ClickTarget::Trigger(id1));
        board.click(ClickTarget::Elsewhere);
        assert!(!board.get(id1).unwrap().is_expanded());

        // picking an option selects it and collapses
        board.click(ClickTarget::Trigger(id1));
        board.click(ClickTarget::Option(id1, b1));
        let s1 = board.get(id1).unwrap();
        assert_eq!(s1.selected(), Some(b1));
        assert!(!s1.is_expanded());
        assert_eq!(board.get(id2).unwrap().selected(), None);
    }
}
