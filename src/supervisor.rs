//! Child-process lifecycle state machine
//!
//! Pure transitions for supervising the chat server process. The binary
//! driver owns the actual spawning and signaling; this module only decides
//! what should happen next, so the escalation logic is testable without
//! processes.

/// Lifecycle of the supervised child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NotStarted,
    Running,
    /// Graceful termination requested; waiting out the grace period
    Stopping,
    Stopped,
}

/// Lifecycle events, triggered by hooks in the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    Start,
    ShutdownRequested,
    /// The child did not exit within the grace period
    GraceExpired,
    ChildExited,
}

/// Side effects the driver must carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorAction {
    SpawnChild,
    /// Graceful termination signal to the child's process group
    SignalTerm,
    /// Forceful kill after the grace period
    SignalKill,
    Finish,
}

/// Result of one transition
#[derive(Debug, PartialEq, Eq)]
pub struct Transition {
    pub next: SupervisorState,
    pub actions: Vec<SupervisorAction>,
}

impl Transition {
    fn to(next: SupervisorState) -> Self {
        Self {
            next,
            actions: vec![],
        }
    }

    fn with(mut self, action: SupervisorAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// Pure transition function. Events that make no sense in the current
/// state are inert: the state is unchanged and no actions are emitted.
pub fn step(state: SupervisorState, event: SupervisorEvent) -> Transition {
    use SupervisorAction::{Finish, SignalKill, SignalTerm, SpawnChild};
    use SupervisorEvent::{ChildExited, GraceExpired, ShutdownRequested, Start};
    use SupervisorState::{NotStarted, Running, Stopped, Stopping};

    match (state, event) {
        (NotStarted, Start) => Transition::to(Running).with(SpawnChild),

        (Running, ShutdownRequested) => Transition::to(Stopping).with(SignalTerm),

        // Child died on its own while we thought it was healthy
        (Running, ChildExited) => Transition::to(Stopped).with(Finish),

        (Stopping, ChildExited) => Transition::to(Stopped).with(Finish),

        // Grace period ran out: escalate, then treat the child as gone
        (Stopping, GraceExpired) => Transition::to(Stopped).with(SignalKill).with(Finish),

        // Everything else is inert
        (state, _) => Transition::to(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SupervisorAction::{Finish, SignalKill, SignalTerm, SpawnChild};
    use SupervisorEvent::{ChildExited, GraceExpired, ShutdownRequested, Start};
    use SupervisorState::{NotStarted, Running, Stopped, Stopping};

    #[test]
    fn start_spawns_child() {
        let t = step(NotStarted, Start);
        assert_eq!(t.next, Running);
        assert_eq!(t.actions, vec![SpawnChild]);
    }

    #[test]
    fn graceful_shutdown_path() {
        let t = step(Running, ShutdownRequested);
        assert_eq!(t.next, Stopping);
        assert_eq!(t.actions, vec![SignalTerm]);

        let t = step(t.next, ChildExited);
        assert_eq!(t.next, Stopped);
        assert_eq!(t.actions, vec![Finish]);
    }

    #[test]
    fn escalation_after_grace_period() {
        let t = step(Stopping, GraceExpired);
        assert_eq!(t.next, Stopped);
        assert_eq!(t.actions, vec![SignalKill, Finish]);
    }

    #[test]
    fn unexpected_child_exit_finishes() {
        let t = step(Running, ChildExited);
        assert_eq!(t.next, Stopped);
        assert_eq!(t.actions, vec![Finish]);
    }

    #[test]
    fn nonsense_events_are_inert() {
        for (state, event) in [
            (NotStarted, ShutdownRequested),
            (NotStarted, GraceExpired),
            (NotStarted, ChildExited),
            (Running, Start),
            (Running, GraceExpired),
            (Stopping, Start),
            (Stopping, ShutdownRequested),
            (Stopped, Start),
            (Stopped, ShutdownRequested),
            (Stopped, GraceExpired),
            (Stopped, ChildExited),
        ] {
            let t = step(state, event);
            assert_eq!(t.next, state, "{state:?} + {event:?} should be inert");
            assert!(t.actions.is_empty(), "{state:?} + {event:?} should emit nothing");
        }
    }
}
