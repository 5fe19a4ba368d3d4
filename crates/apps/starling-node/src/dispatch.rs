//! Handler dispatch (C10, §4.10): a static `kind -> handler` table. Each
//! handler is a pure function of `(msg, context)` returning a small closed
//! set of actions; an allowlist per kind drops anything outside it.
//!
//! The actual decision-making collaborator (an external agent deciding
//! *what* to reply, per §4.10) is not part of this crate; this module only
//! validates, allowlists, and enqueues what such a collaborator would
//! return. No kind currently has a handler registered — this is the seam
//! future kinds plug into.

use starling_types::SignedMessage;

/// The closed set of actions a handler may produce (§4.10).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Publish(SignedMessage),
    Reply { parent_id: String, text: String },
    React { target_id: String, emoji: String },
    Ignore { reason: String },
}

impl Action {
    fn tag(&self) -> &'static str {
        match self {
            Self::Publish(_) => "publish",
            Self::Reply { .. } => "reply",
            Self::React { .. } => "react",
            Self::Ignore { .. } => "ignore",
        }
    }
}

/// A handler entry: its kind, the actions it is permitted to produce, and
/// the function itself.
pub struct HandlerEntry {
    pub kind: u16,
    pub allowlist: &'static [&'static str],
    pub handler: fn(&SignedMessage) -> Vec<Action>,
}

/// Drop any action outside `allowlist`, logging what was dropped.
fn filter_allowed(actions: Vec<Action>, allowlist: &[&str]) -> Vec<Action> {
    actions
        .into_iter()
        .filter(|action| {
            let allowed = allowlist.contains(&action.tag());
            if !allowed {
                tracing::warn!(action = action.tag(), "dropping action outside its kind's allowlist");
            }
            allowed
        })
        .collect()
}

/// The static table. Empty until a concrete application kind needs one;
/// entries are added here, not scattered across the codebase.
static HANDLERS: &[HandlerEntry] = &[];

fn lookup(kind: u16) -> Option<&'static HandlerEntry> {
    HANDLERS.iter().find(|entry| entry.kind == kind)
}

/// Run the handler registered for `msg.kind`, if any, enqueuing whatever
/// allowlisted actions it produces. A no-op for kinds with no handler.
pub fn dispatch(msg: &SignedMessage) -> Vec<Action> {
    match lookup(msg.kind) {
        Some(entry) => filter_allowed((entry.handler)(msg), entry.allowlist),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(kind: u16) -> SignedMessage {
        let (sk, pk) = starling_crypto::generate_identity();
        let author = starling_crypto::peer_id_from_public_key(&pk);
        starling_wire::sign_message(&sk, author, 1000, kind, vec![], "x".into())
    }

    #[test]
    fn unregistered_kind_dispatches_to_nothing() {
        assert!(dispatch(&msg(1)).is_empty());
    }

    #[test]
    fn allowlist_drops_disallowed_actions() {
        let actions = vec![
            Action::Ignore { reason: "allowed".to_string() },
            Action::Publish(msg(1)),
        ];
        let filtered = filter_allowed(actions, &["ignore"]);
        assert_eq!(filtered.len(), 1);
        assert!(matches!(filtered[0], Action::Ignore { .. }));
    }
}
