//! Widget notifications and the commands they lead to.
//!
//! Widget listeners never touch the session directly: they post a
//! [`UiEvent`] on the [`EventBus`], which the session drains in order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::config::ConfigValue;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Boolean or enum widget changed; `None` is "Any".
    Selected {
        name: String,
        new: Option<ConfigValue>,
        old: Option<ConfigValue>,
    },
    /// Choice group changed; values are the member variable names.
    GroupSelected {
        group: usize,
        new: Option<String>,
        old: Option<String>,
    },
    /// Enabled number slid.
    NumberChanged { name: String, new: f64, old: f64 },
    NumberToggled { name: String, enabled: bool, value: f64 },
}

impl UiEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            UiEvent::Selected { .. } => "selected",
            UiEvent::GroupSelected { .. } => "group_selected",
            UiEvent::NumberChanged { .. } => "number_changed",
            UiEvent::NumberToggled { .. } => "number_toggled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Refresh probabilities for the current configuration.
    Predict,
    /// Build a PDF straight from the configuration.
    BuildFromConfig,
}

/// Single-threaded FIFO shared between widget listeners and the session.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    queue: Rc<RefCell<VecDeque<UiEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: UiEvent) {
        self.queue.borrow_mut().push_back(event);
    }

    pub fn pop(&self) -> Option<UiEvent> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }
}
