//! Headless widget models.
//!
//! Widgets hold their own state and notify listeners synchronously; they
//! know nothing about the configuration or the server. The session wires
//! their listeners to its event bus.

pub mod choice;
pub mod listeners;
pub mod number;
pub mod select;

pub use choice::{ChoiceEntry, ChoiceKind, ChoiceOption, SelectionListener, ANY};
pub use listeners::{ListenerId, Listeners};
pub use number::{ChangeListener, NumberOption, ToggleListener, MAX_DECIMALS};
pub use select::{ClickTarget, CustomOption, CustomSelect, OptionId, SelectBoard, SelectId, SelectListener};
