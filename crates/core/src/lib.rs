//! Domain types, error taxonomy and configuration shared by the icecream
//! backlog crates.

pub mod config;
pub mod domain;
pub mod errors;

pub use domain::backlog::{BacklogEntry, EntryId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
