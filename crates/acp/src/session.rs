//! Per-session turn state: tracks the cancellation token for whichever
//! `session/prompt` turn is currently in flight for a session, so an
//! incoming `session/cancel` notification can reach it (spec.md §4.6
//! "Cancellation coupling").

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use crate::schema::SessionId;

#[derive(Default)]
pub struct TurnRegistry {
    turns: Mutex<HashMap<SessionId, CancellationToken>>,
}

impl TurnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh cancellation token for a new `session/prompt` turn.
    /// Replaces (and thereby orphans, without cancelling) any stale token
    /// left behind by a turn that finished without calling
    /// [`Self::end_turn`].
    pub fn begin_turn(&self, session_id: SessionId) -> CancellationToken {
        let token = CancellationToken::new();
        self.turns.lock().unwrap().insert(session_id, token.clone());
        token
    }

    /// Fires the cancellation token for `session_id`'s in-flight turn, if
    /// any. Returns `true` if a turn was actually in flight.
    pub fn cancel(&self, session_id: &SessionId) -> bool {
        match self.turns.lock().unwrap().get(session_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Clears the turn slot once `session/prompt` has returned, whether by
    /// completion or cancellation.
    pub fn end_turn(&self, session_id: &SessionId) {
        self.turns.lock().unwrap().remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_without_an_in_flight_turn_returns_false() {
        let registry = TurnRegistry::new();
        assert!(!registry.cancel(&SessionId::new("sess-1")));
    }

    #[test]
    fn cancel_fires_the_turns_token() {
        let registry = TurnRegistry::new();
        let token = registry.begin_turn(SessionId::new("sess-1"));
        assert!(!token.is_cancelled());
        assert!(registry.cancel(&SessionId::new("sess-1")));
        assert!(token.is_cancelled());
    }

    #[test]
    fn end_turn_clears_the_slot() {
        let registry = TurnRegistry::new();
        registry.begin_turn(SessionId::new("sess-1"));
        registry.end_turn(&SessionId::new("sess-1"));
        assert!(!registry.cancel(&SessionId::new("sess-1")));
    }
}
