use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use icecream_core::domain::backlog::{BacklogEntry, EntryId};
use icecream_core::errors::{ApplicationError, DomainError};

use crate::message::{self, SlashReply};

/// Form fields Slack posts for a slash-command invocation.
///
/// Missing fields decode as empty strings so the caller can apply its own
/// gatekeeping (a missing token is just a wrong token).
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SlashCommandPayload {
    pub token: String,
    pub text: String,
    pub ssl_check: String,
    pub channel_id: String,
    pub user_id: String,
}

impl SlashCommandPayload {
    /// Slack's periodic certificate check.
    pub fn is_ssl_check(&self) -> bool {
        self.ssl_check == "1"
    }
}

impl fmt::Debug for SlashCommandPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashCommandPayload")
            .field("token", &"[REDACTED]")
            .field("text", &self.text)
            .field("ssl_check", &self.ssl_check)
            .field("channel_id", &self.channel_id)
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BacklogCommand {
    Help,
    List,
    Add { name: String },
    Delete { raw_id: String },
    Unknown,
}

impl BacklogCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::List => "list",
            Self::Add { .. } => "add",
            Self::Delete { .. } => "del",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error(transparent)]
    InvalidArgument(#[from] DomainError),
    #[error("command service failed: {0}")]
    Service(String),
}

impl From<CommandRouteError> for ApplicationError {
    fn from(value: CommandRouteError) -> Self {
        match value {
            CommandRouteError::InvalidArgument(error) => Self::Domain(error),
            CommandRouteError::Service(message) => Self::Storage(message),
        }
    }
}

/// Matches trimmed command text exactly; arguments are everything after the
/// verb and its separating space.
pub fn parse_backlog_command(input: &str) -> BacklogCommand {
    let text = input.trim();
    match text {
        "help" => BacklogCommand::Help,
        "list" => BacklogCommand::List,
        _ => {
            if let Some(name) = text.strip_prefix("add ") {
                BacklogCommand::Add { name: name.to_owned() }
            } else if let Some(raw_id) = text.strip_prefix("del ") {
                BacklogCommand::Delete { raw_id: raw_id.to_owned() }
            } else {
                BacklogCommand::Unknown
            }
        }
    }
}

#[async_trait]
pub trait BacklogCommandService: Send + Sync {
    async fn add_entry(&self, name: &str) -> Result<EntryId, CommandRouteError>;

    async fn delete_entry(&self, id: EntryId) -> Result<String, CommandRouteError>;

    async fn list_entries(&self) -> Result<Vec<BacklogEntry>, CommandRouteError>;
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: BacklogCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Runs one command. `Ok(None)` means the text was not a command and the
    /// webhook should answer with an empty body.
    pub async fn route(
        &self,
        command: BacklogCommand,
    ) -> Result<Option<SlashReply>, CommandRouteError> {
        match command {
            BacklogCommand::Help => Ok(Some(message::help_message())),
            BacklogCommand::List => {
                let entries = self.service.list_entries().await?;
                debug!(entry_count = entries.len(), "backlog listed");
                Ok(Some(message::backlog_message(&entries)))
            }
            BacklogCommand::Add { name } => {
                let id = self.service.add_entry(&name).await?;
                debug!(entry_id = %id, "backlog entry added");
                Ok(Some(message::added_message(&name)))
            }
            BacklogCommand::Delete { raw_id } => {
                let id = raw_id.parse::<EntryId>()?;
                let name = self.service.delete_entry(id).await?;
                debug!(entry_id = %id, "backlog entry deleted");
                Ok(Some(message::deleted_message(&name, id)))
            }
            BacklogCommand::Unknown => Ok(None),
        }
    }
}
