//! # Typist Menu
//!
//! The command surface of typist: the menu model built from the snippet
//! library, parsing of menu item ids, and the [`Dispatcher`] that turns menu
//! clicks, keyboard shortcuts and JSON messages into typing engine calls.

mod action;
mod dispatcher;
mod error;
mod message;
mod model;

pub use action::MenuAction;
pub use dispatcher::{Dispatcher, START_TYPING_SHORTCUT};
pub use error::DispatchError;
pub use message::{Request, Response};
pub use model::{build_menu, truncate_title, MenuItem, EDITABLE_CONTEXT};
