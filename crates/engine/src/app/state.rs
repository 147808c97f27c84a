use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientState {
    #[default]
    Offline,
    Connecting,
    Loading,
    Online,
    DemoPlayback,
    Quitting,
}

impl ClientState {
    pub const ALL: [ClientState; 6] = [
        ClientState::Offline,
        ClientState::Connecting,
        ClientState::Loading,
        ClientState::Online,
        ClientState::DemoPlayback,
        ClientState::Quitting,
    ];

    pub const fn is_terminal(self) -> bool {
        matches!(self, ClientState::Quitting)
    }
}

/// Owner of the client state. `Quitting` absorbs every later transition.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: ClientState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Returns `false` when the request was absorbed by the terminal state.
    pub fn set_state(&mut self, next: ClientState, log_transition: bool) -> bool {
        if self.state.is_terminal() {
            return false;
        }

        if log_transition {
            debug!(last = ?self.state, current = ?next, "state_change");
        }
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_offline() {
        assert_eq!(StateMachine::new().state(), ClientState::Offline);
    }

    #[test]
    fn any_non_terminal_state_can_reach_any_other() {
        for from in ClientState::ALL {
            if from.is_terminal() {
                continue;
            }
            for to in ClientState::ALL {
                let mut machine = StateMachine::new();
                assert!(machine.set_state(from, false));
                assert!(machine.set_state(to, true));
                assert_eq!(machine.state(), to);
            }
        }
    }

    #[test]
    fn quitting_absorbs_every_later_transition() {
        for prefix in ClientState::ALL {
            let mut machine = StateMachine::new();
            machine.set_state(prefix, false);
            machine.set_state(ClientState::Quitting, false);

            for next in ClientState::ALL {
                let applied = machine.set_state(next, true);
                assert!(!applied);
                assert_eq!(machine.state(), ClientState::Quitting);
            }
        }
    }

    #[test]
    fn repeated_sequences_stay_terminal_after_quit() {
        let sequence = [
            ClientState::Connecting,
            ClientState::Loading,
            ClientState::Online,
            ClientState::Quitting,
            ClientState::Offline,
            ClientState::DemoPlayback,
            ClientState::Online,
        ];
        let mut machine = StateMachine::new();
        let mut reached_quit = false;
        for next in sequence {
            machine.set_state(next, false);
            reached_quit |= next == ClientState::Quitting;
            if reached_quit {
                assert_eq!(machine.state(), ClientState::Quitting);
            } else {
                assert_eq!(machine.state(), next);
            }
        }
    }
}
