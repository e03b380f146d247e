pub mod client;
pub mod colors;
pub mod config;
pub mod events;
pub mod generation;
pub mod logging;
pub mod picker;
pub mod probas;
pub mod reducer;
pub mod results;
pub mod session;
pub mod settings;
pub mod source;
pub mod widgets;
