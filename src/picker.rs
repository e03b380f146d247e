//! Project file picker fed by `GET /filenames`, shown as a [`CustomSelect`].

use crate::config::ConfigValue;
use crate::widgets::{ClickTarget, CustomSelect};

#[derive(Debug)]
pub struct FilePicker {
    select: CustomSelect,
}

impl Default for FilePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl FilePicker {
    /// Starts with nothing selected.
    pub fn new() -> Self {
        Self { select: CustomSelect::new(None) }
    }

    /// Appends names not already listed. The current selection is kept.
    pub fn load<I: IntoIterator<Item = String>>(&mut self, names: I) {
        for name in names {
            if self.select.find(&name).is_none() {
                let value = Some(ConfigValue::Text(name.clone()));
                self.select.add_option(&name, value, None);
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.select.options().iter().map(|o| o.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.select.options().len()
    }

    pub fn is_empty(&self) -> bool {
        self.select.options().is_empty()
    }

    pub fn select(&mut self, name: &str) -> bool {
        match self.select.find(name) {
            Some(id) => {
                self.select.select_option(id);
                true
            }
            None => false,
        }
    }

    pub fn selection(&self) -> Option<&str> {
        self.select.selected_option().map(|o| o.name.as_str())
    }

    pub fn is_selected(&self) -> bool {
        self.select.selected().is_some()
    }

    /// Routes a page click to the underlying select.
    pub fn click(&mut self, target: ClickTarget) {
        if let ClickTarget::Option(sid, oid) = target {
            if sid == self.select.id() {
                self.select.select_option(oid);
            }
        }
        self.select.handle_click(target);
    }

    pub fn widget(&self) -> &CustomSelect {
        &self.select
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_known_only() {
        let mut p = FilePicker::new();
        p.load(vec!["main.tex".to_string(), "paper.tex".to_string(), "main.tex".to_string()]);
        assert_eq!(p.len(), 2);
        assert!(!p.select("other.tex"));
        assert!(!p.is_selected());
        assert!(p.select("paper.tex"));
        assert_eq!(p.selection(), Some("paper.tex"));
        assert_eq!(p.names().collect::<Vec<_>>(), vec!["main.tex", "paper.tex"]);
    }

    #[test]
    fn test_click_selects_and_collapses() {
        let mut p = FilePicker::new();
        p.load(vec!["a.tex".to_string(), "b.tex".to_string()]);
        let sid = p.widget().id();
        p.click(ClickTarget::Trigger(sid));
        assert!(p.widget().is_expanded());
        let b = p.widget().find("b.tex").unwrap();
        p.click(ClickTarget::Option(sid, b));
        assert_eq!(p.selection(), Some("b.tex"));
        assert!(!p.widget().is_expanded());
        assert!(p.widget().alternatives().all(|(_, o)| o.name != "b.tex"));
    }
}
