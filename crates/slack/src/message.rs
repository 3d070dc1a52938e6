use serde::Serialize;

use icecream_core::domain::backlog::{BacklogEntry, EntryId};

pub const EMPTY_BACKLOG_TEXT: &str = "The icecream backlog is empty. Tread lightly.";

const HELP_LINES: [&str; 5] = [
    "*Did someone leave their screen unlocked? Usage:*",
    "`/icecream add <username>` to add a user to the owing backlog",
    "`/icecream del <id>` to delete a user by id, use `list` to find id",
    "`/icecream list` to list owing users",
    "`/icecream help` to display this usage information",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Broadcast to the whole channel.
    InChannel,
    /// Shown only to the user who ran the command.
    Ephemeral,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashReply {
    pub response_type: ResponseType,
    pub text: String,
}

impl SlashReply {
    pub fn public(text: impl Into<String>) -> Self {
        Self { response_type: ResponseType::InChannel, text: text.into() }
    }

    pub fn private(text: impl Into<String>) -> Self {
        Self { response_type: ResponseType::Ephemeral, text: text.into() }
    }
}

pub fn help_message() -> SlashReply {
    SlashReply::private(HELP_LINES.join("\n"))
}

pub fn backlog_message(entries: &[BacklogEntry]) -> SlashReply {
    if entries.is_empty() {
        return SlashReply::public(EMPTY_BACKLOG_TEXT);
    }

    let lines: Vec<String> =
        entries.iter().map(|entry| format!("{}. {}", entry.id, entry.name)).collect();
    SlashReply::public(lines.join("\n"))
}

pub fn added_message(name: &str) -> SlashReply {
    SlashReply::public(format!("Added {name} to the queue."))
}

pub fn deleted_message(name: &str, id: EntryId) -> SlashReply {
    SlashReply::public(format!("Deleted {name} ({id}) from the queue."))
}
