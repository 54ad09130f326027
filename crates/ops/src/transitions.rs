use roster_core::entities::{DEFAULT_PLAN, SUSPENDED_PLAN};
use roster_core::{Download, Message, Post, Report, Ticket, TicketStatus, Transaction, User};

use crate::{unsupported, Action, ActionContext, Actionable, Mutation, TransitionError, DEFAULT_CLOSE_REASON};

impl Actionable for User {
    fn transition(&self, action: &Action, _ctx: &ActionContext) -> Result<Mutation<Self>, TransitionError> {
        let mut next = self.clone();
        match action {
            Action::Suspend => {
                next.is_disabled = true;
                next.plan = SUSPENDED_PLAN.to_string();
            }
            Action::Enable => {
                next.is_disabled = false;
                if next.plan.is_empty() {
                    next.plan = DEFAULT_PLAN.to_string();
                }
            }
            Action::Verify => next.verified = true,
            Action::Unverify => next.verified = false,
            Action::Delete => return Ok(Mutation::Remove),
            other => return Err(unsupported::<Self>(other)),
        }
        Ok(Mutation::Replace(next))
    }
}

fn invalid(action: &Action, from: &TicketStatus) -> TransitionError {
    TransitionError::InvalidTransition { action: action.name(), from: from.to_string() }
}

impl Actionable for Ticket {
    fn transition(&self, action: &Action, ctx: &ActionContext) -> Result<Mutation<Self>, TransitionError> {
        action.validate()?;
        let mut next = self.clone();
        match action {
            Action::CloseTicket { reason } => {
                if next.status == TicketStatus::Closed {
                    return Err(invalid(action, &next.status));
                }
                let reason = reason.as_deref().map(str::trim).filter(|r| !r.is_empty()).unwrap_or(DEFAULT_CLOSE_REASON);
                next.status = TicketStatus::Closed;
                next.close_reason = Some(reason.to_string());
            }
            Action::SendReply { text } => {
                next.thread.push(Message {
                    id: ctx.message_id.clone(),
                    from: "admin".to_string(),
                    body: text.trim().to_string(),
                    sender: ctx.sender.clone(),
                    timestamp: ctx.timestamp(),
                });
            }
            Action::StartProgress => {
                if next.status != TicketStatus::Open {
                    return Err(invalid(action, &next.status));
                }
                next.status = TicketStatus::InProgress;
            }
            Action::Reopen => {
                if next.status != TicketStatus::Closed {
                    return Err(invalid(action, &next.status));
                }
                next.status = TicketStatus::Open;
                next.close_reason = None;
            }
            Action::Delete => return Ok(Mutation::Remove),
            other => return Err(unsupported::<Self>(other)),
        }
        next.updated_at = ctx.timestamp();
        Ok(Mutation::Replace(next))
    }
}

impl Actionable for Download {
    fn transition(&self, action: &Action, _ctx: &ActionContext) -> Result<Mutation<Self>, TransitionError> {
        action.validate()?;
        match action {
            Action::UpdateProgress { delta } => Ok(Mutation::Replace(self.advanced(*delta))),
            Action::Delete => Ok(Mutation::Remove),
            other => Err(unsupported::<Self>(other)),
        }
    }
}

impl Actionable for Transaction {}
impl Actionable for Report {}
impl Actionable for Post {}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::Entity;
    use serde_json::json;

    fn ctx() -> ActionContext { ActionContext::at(1_700_000_000_000, "msg_1") }

    fn replaced<E>(m: Result<Mutation<E>, TransitionError>) -> E {
        match m {
            Ok(Mutation::Replace(e)) => e,
            other => panic!("expected replace, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn suspend_then_enable_keeps_plan() {
        let u = User::normalize(&json!({"userId": "1", "subscriptionPlan": "Premium"}));
        let s = replaced(u.transition(&Action::Suspend, &ctx()));
        assert!(s.is_disabled);
        assert_eq!(s.plan, SUSPENDED_PLAN);
        let e = replaced(s.transition(&Action::Enable, &ctx()));
        assert!(!e.is_disabled);
        assert_eq!(e.plan, SUSPENDED_PLAN);

        let mut blank = u.clone();
        blank.plan.clear();
        assert_eq!(replaced(blank.transition(&Action::Enable, &ctx())).plan, DEFAULT_PLAN);
    }

    #[test]
    fn users_do_not_take_ticket_actions() {
        let u = User::normalize(&json!({"userId": "1"}));
        assert!(matches!(
            u.transition(&Action::Reopen, &ctx()),
            Err(TransitionError::Unsupported { action: "reopen", .. })
        ));
        assert_eq!(u.transition(&Action::Delete, &ctx()), Ok(Mutation::Remove));
    }

    #[test]
    fn ticket_lifecycle() {
        let t = Ticket::normalize(&json!({"ticketId": "1", "status": "open"}));
        let p = replaced(t.transition(&Action::StartProgress, &ctx()));
        assert_eq!(p.status, TicketStatus::InProgress);
        assert!(p.transition(&Action::StartProgress, &ctx()).is_err());

        let c = replaced(p.transition(&Action::CloseTicket { reason: None }, &ctx()));
        assert_eq!(c.status, TicketStatus::Closed);
        assert_eq!(c.close_reason.as_deref(), Some(DEFAULT_CLOSE_REASON));
        assert_eq!(c.updated_at, ctx().timestamp());
        assert!(matches!(
            c.transition(&Action::CloseTicket { reason: None }, &ctx()),
            Err(TransitionError::InvalidTransition { .. })
        ));

        let o = replaced(c.transition(&Action::Reopen, &ctx()));
        assert_eq!(o.status, TicketStatus::Open);
        assert_eq!(o.close_reason, None);
    }

    #[test]
    fn reply_appends_in_order() {
        let t = Ticket::normalize(&json!({"ticketId": "1", "messages": [{"id": "m0", "message": "help"}]}));
        let r = replaced(t.transition(&Action::SendReply { text: " on it ".into() }, &ctx()));
        assert_eq!(r.thread.len(), 2);
        assert_eq!(r.thread[0].id, "m0");
        assert_eq!(r.thread[1].body, "on it");
        assert_eq!(r.thread[1].from, "admin");
        assert_eq!(r.thread[1].timestamp, ctx().timestamp());
        assert!(t.transition(&Action::SendReply { text: "".into() }, &ctx()).is_err());
    }

    #[test]
    fn progress_and_read_only_kinds() {
        let d = Download::normalize(&json!({"id": 1, "progress": 95}));
        let n = replaced(d.transition(&Action::UpdateProgress { delta: 10.0 }, &ctx()));
        assert_eq!(n.progress, 100.0);
        let tx = Transaction::normalize(&json!({"_id": "t"}));
        assert!(tx.transition(&Action::Verify, &ctx()).is_err());
        assert_eq!(tx.transition(&Action::Delete, &ctx()), Ok(Mutation::Remove));
    }
}
