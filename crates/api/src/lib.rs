//! Roster public API façade (in-process).
//!
//! A [`Coordinator`] owns one entity collection together with its view state
//! and drives loads and actions against injected collaborators: a
//! [`DataSource`], a [`RemoteActions`] round trip, a [`Notifier`] and an
//! optional [`SelectionMirror`].

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

pub use roster_core::{Dashboard, Entity, EntityKind, RawRecord};
pub use roster_ops::{Action, Actionable, MockRemote, RemoteActions};
pub use roster_search::{ViewState, VisibleSlice};

mod bus;
mod config;
mod coordinator;
mod dashboard;
pub mod fixtures;
mod notify;
mod selection;
mod source;

pub use bus::{RecordUpdate, UpdateBus};
pub use config::RosterConfig;
pub use dashboard::load_dashboard;
pub use coordinator::{ActionOutcome, ActionTicket, Coordinator, LoadOutcome, LoadTicket};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use selection::{QuerySelection, SelectionMirror, REPORT_DATE_KEY, REPORT_TYPE_KEY};
pub use source::{DataSource, MockSource};

/// Errors surfaced at the coordinator boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum RosterError {
    #[error("load: {0}")]
    Load(String),
    #[error("action: {0}")]
    Action(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("invalid_transition: {0}")]
    InvalidTransition(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("not_found: {0}")]
    NotFound(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type RosterResult<T> = Result<T, RosterError>;

impl From<roster_ops::TransitionError> for RosterError {
    fn from(e: roster_ops::TransitionError) -> Self {
        use roster_ops::TransitionError as T;
        let msg = e.to_string();
        match e {
            T::Unsupported { .. } => RosterError::Unsupported(msg),
            T::InvalidTransition { .. } => RosterError::InvalidTransition(msg),
            T::Validation(_) => RosterError::Validation(msg),
        }
    }
}

impl From<serde_json::Error> for RosterError {
    fn from(e: serde_json::Error) -> Self { RosterError::Internal(e.to_string()) }
}
