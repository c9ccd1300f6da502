use serde::Serialize;

use super::dispatcher::ActionReceipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryKind {
    Player,
    Dm,
    Roll,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionLogEntry {
    pub id: u64,
    pub kind: LogEntryKind,
    pub author: String,
    pub message: String,
}

/// Append-only record of what happened; the only trace a resolved action leaves.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    entries: Vec<ActionLogEntry>,
    next_id: u64,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: LogEntryKind,
        author: impl Into<String>,
        message: impl Into<String>,
    ) -> &ActionLogEntry {
        self.next_id += 1;
        self.entries.push(ActionLogEntry {
            id: self.next_id,
            kind,
            author: author.into(),
            message: message.into(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn record_receipt(&mut self, receipt: &ActionReceipt) -> &ActionLogEntry {
        self.push(
            LogEntryKind::Player,
            receipt.actor.as_str(),
            receipt.action.to_string(),
        )
    }

    pub fn entries(&self) -> &[ActionLogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
