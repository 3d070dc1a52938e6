//! Slack slash-command interface for the icecream backlog.
//!
//! - **Slash Commands** (`commands`) - `/icecream add|del|list|help` parsing and routing
//! - **Messages** (`message`) - `in_channel` / `ephemeral` reply payloads
//! - **Verification** (`verification`) - shared-secret token check for inbound webhooks
//!
//! # Architecture
//!
//! ```text
//! Webhook form → parse_backlog_command → CommandRouter → BacklogCommandService
//!                                              ↓
//!                                        SlashReply (JSON)
//! ```

pub mod commands;
pub mod message;
pub mod verification;
