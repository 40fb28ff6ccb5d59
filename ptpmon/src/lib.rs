pub mod console;
pub mod events;
pub mod monitor;
pub mod record;
pub mod render;
pub mod store;
pub mod tail;
pub mod terminal;

pub use console::{Console, ConsoleConfig, ConsoleError, Mode, Step};
pub use monitor::Monitor;
pub use tail::{LogTail, StartAt};
pub use terminal::{Key, Panel, Refresh, Terminal};
