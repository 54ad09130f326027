//! Roster ops: actions on canonical records.
//!
//! An action is first turned into a [`Mutation`] by a pure transition
//! ([`Actionable::transition`]), then confirmed by a remote round trip
//! ([`RemoteActions`]). Committing the mutation is up to the caller.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use roster_core::normalize::{now_ms, render_timestamp};
use roster_core::{Entity, EntityKind};
use serde::{Deserialize, Serialize};

mod remote;
mod transitions;

pub use remote::{MockRemote, RemoteActions, RemoteCall};

pub const DEFAULT_CLOSE_REASON: &str = "Issue resolved";

/// A user-initiated change to one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    Suspend,
    Enable,
    Verify,
    Unverify,
    Delete,
    CloseTicket {
        #[serde(default)]
        reason: Option<String>,
    },
    SendReply {
        text: String,
    },
    StartProgress,
    Reopen,
    UpdateProgress {
        delta: f64,
    },
}

impl Action {
    pub const NAMES: [&'static str; 10] = [
        "suspend",
        "enable",
        "verify",
        "unverify",
        "delete",
        "close-ticket",
        "send-reply",
        "start-progress",
        "reopen",
        "update-progress",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Action::Suspend => "suspend",
            Action::Enable => "enable",
            Action::Verify => "verify",
            Action::Unverify => "unverify",
            Action::Delete => "delete",
            Action::CloseTicket { .. } => "close-ticket",
            Action::SendReply { .. } => "send-reply",
            Action::StartProgress => "start-progress",
            Action::Reopen => "reopen",
            Action::UpdateProgress { .. } => "update-progress",
        }
    }

    /// Build an action from its name and an optional argument
    /// (close reason, reply text or progress delta).
    pub fn from_parts(name: &str, arg: Option<&str>) -> Result<Self, TransitionError> {
        let action = match name {
            "suspend" => Action::Suspend,
            "enable" => Action::Enable,
            "verify" => Action::Verify,
            "unverify" => Action::Unverify,
            "delete" => Action::Delete,
            "close-ticket" | "close" => Action::CloseTicket { reason: arg.map(str::to_string) },
            "send-reply" | "reply" => Action::SendReply { text: arg.unwrap_or_default().to_string() },
            "start-progress" => Action::StartProgress,
            "reopen" => Action::Reopen,
            "update-progress" | "progress" => {
                let raw = arg.ok_or_else(|| TransitionError::Validation("update-progress needs a delta".into()))?;
                let delta = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|d| d.is_finite())
                    .ok_or_else(|| TransitionError::Validation(format!("invalid progress delta: {raw}")))?;
                Action::UpdateProgress { delta }
            }
            other => return Err(TransitionError::Validation(format!("unknown action: {other}"))),
        };
        Ok(action)
    }

    /// Reject malformed actions before any round trip.
    pub fn validate(&self) -> Result<(), TransitionError> {
        match self {
            Action::SendReply { text } if text.trim().is_empty() => Err(TransitionError::Validation("reply is empty".into())),
            Action::UpdateProgress { delta } if !delta.is_finite() => {
                Err(TransitionError::Validation("progress delta must be finite".into()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Action {
    type Err = TransitionError;

    /// `name` or `name:arg`, e.g. `close-ticket:duplicate`, `update-progress:15`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, arg)) => Action::from_parts(name, Some(arg)),
            None => Action::from_parts(s, None),
        }
    }
}

/// Effect of an action on the collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<E> {
    Replace(E),
    Remove,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("{action} is not supported for {kind}")]
    Unsupported { action: &'static str, kind: EntityKind },
    #[error("cannot {action} a {from} ticket")]
    InvalidTransition { action: &'static str, from: String },
    #[error("invalid action: {0}")]
    Validation(String),
}

/// Inputs a transition may need besides the record; fixed per invocation so
/// transitions stay pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    pub now_ms: i64,
    /// Id given to a message created by the action.
    pub message_id: String,
    pub sender: String,
}

impl ActionContext {
    pub fn now() -> Self {
        Self { now_ms: now_ms(), message_id: format!("msg_{}", uuid::Uuid::new_v4()), sender: "Admin".to_string() }
    }

    pub fn at(now_ms: i64, message_id: impl Into<String>) -> Self {
        Self { now_ms, message_id: message_id.into(), sender: "Admin".to_string() }
    }

    pub fn timestamp(&self) -> String { render_timestamp(self.now_ms).unwrap_or_default() }
}

/// Entities that actions can be applied to.
pub trait Actionable: Entity {
    /// Pure: the new state of `self` under `action`. Every entity supports delete.
    fn transition(&self, action: &Action, ctx: &ActionContext) -> Result<Mutation<Self>, TransitionError> {
        let _ = ctx;
        match action {
            Action::Delete => Ok(Mutation::Remove),
            other => Err(unsupported::<Self>(other)),
        }
    }
}

pub(crate) fn unsupported<E: Entity>(action: &Action) -> TransitionError {
    TransitionError::Unsupported { action: action.name(), kind: E::KIND }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_arguments() {
        assert_eq!("close-ticket".parse::<Action>(), Ok(Action::CloseTicket { reason: None }));
        assert_eq!(
            "close-ticket:duplicate".parse::<Action>(),
            Ok(Action::CloseTicket { reason: Some("duplicate".into()) })
        );
        assert_eq!("update-progress:12.5".parse::<Action>(), Ok(Action::UpdateProgress { delta: 12.5 }));
        assert!("update-progress:fast".parse::<Action>().is_err());
        assert!("explode".parse::<Action>().is_err());
        for name in Action::NAMES {
            let arg = if name == "update-progress" { Some("1") } else { Some("x") };
            assert_eq!(Action::from_parts(name, arg).map(|a| a.name()), Ok(name));
        }
    }

    #[test]
    fn blank_reply_is_invalid() {
        assert!(Action::SendReply { text: "  ".into() }.validate().is_err());
        assert!(Action::SendReply { text: "ok".into() }.validate().is_ok());
    }

    #[test]
    fn serde_shape() {
        let v = serde_json::to_value(Action::SendReply { text: "hi".into() }).unwrap();
        assert_eq!(v, serde_json::json!({"action": "send-reply", "text": "hi"}));
    }
}
