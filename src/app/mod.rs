//! Interactive application: messages in, commands out.

pub mod cmd;
pub mod keymap;
pub mod model;
pub mod msg;
pub mod runtime;
pub mod terminal;

pub use cmd::Cmd;
pub use keymap::{Action, KeyBinding, KeyMap};
pub use model::Model;
pub use msg::{DataUpdate, Msg};
pub use runtime::{Event, Runtime};
pub use terminal::{Screen, Terminal};
