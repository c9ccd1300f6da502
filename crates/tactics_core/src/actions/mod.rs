mod action;
mod dispatcher;
mod log;

pub use action::{Action, ActionKind};
pub use dispatcher::{
    ActionDispatcher, ActionReceipt, DispatcherConfig, LocalDispatcher, DEFAULT_DISPATCH_DELAY,
};
pub use log::{ActionLog, ActionLogEntry, LogEntryKind};
