//! Pure Bully role transitions. `next_role` decides the new role and the side effects; the
//! `Election` component executes them while holding its state lock.

use crate::errors::{new_err, Result};

/// Role of the local process in the Bully protocol. Every role is re-enterable.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display)]
pub enum ElectionRole {
    Normal,
    Candidate,
    Leader,
}

impl Default for ElectionRole {
    fn default() -> Self {
        ElectionRole::Normal
    }
}

/// Input of the role state machine. `from_higher` compares the sender id with the local id.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display)]
pub enum ElectionEvent {
    #[display(fmt = "start election")]
    StartElection,
    #[display(fmt = "ELECTION (from higher: {})", from_higher)]
    ElectionReceived { from_higher: bool },
    #[display(fmt = "ANSWER (from higher: {})", from_higher)]
    AnswerReceived { from_higher: bool },
    #[display(fmt = "COORDINATOR (from higher: {})", from_higher)]
    CoordinatorReceived { from_higher: bool },
    #[display(fmt = "win election")]
    WinElection,
    #[display(fmt = "leader reset")]
    LeaderReset,
}

/// Side effect requested by a transition.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ElectionAction {
    BroadcastElection,
    BroadcastAnswer,
    BroadcastCoordinator,
    /// Known leader := sender of the triggering message.
    AdoptSenderAsLeader,
    /// Known leader := self.
    ClaimLeadership,
    ClearKnownLeader,
    /// A new election attempt is outstanding and must be resolved by the election timeout.
    BeginCampaign,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    pub role: ElectionRole,
    pub actions: Vec<ElectionAction>,
}

impl Transition {
    fn to(role: ElectionRole, actions: Vec<ElectionAction>) -> Transition {
        Transition { role, actions }
    }

    fn stay(role: ElectionRole) -> Transition {
        Transition {
            role,
            actions: Vec::new(),
        }
    }
}

pub fn next_role(role: ElectionRole, event: ElectionEvent) -> Result<Transition> {
    use ElectionAction::*;
    use ElectionEvent::*;
    use ElectionRole::*;

    let transition = match (role, event) {
        (Normal, StartElection) => Transition::to(Candidate, vec![BroadcastElection, BeginCampaign]),
        (Normal, ElectionReceived { from_higher: false }) => Transition::to(
            Candidate,
            vec![BroadcastAnswer, BroadcastElection, BeginCampaign],
        ),
        (Normal, ElectionReceived { from_higher: true }) => Transition::stay(Normal),
        (Normal, AnswerReceived { .. }) => Transition::stay(Normal),
        (Normal, CoordinatorReceived { .. }) => Transition::to(Normal, vec![AdoptSenderAsLeader]),
        (Normal, LeaderReset) => Transition::to(Normal, vec![ClearKnownLeader]),

        (Candidate, ElectionReceived { from_higher: false }) => {
            Transition::to(Candidate, vec![BroadcastAnswer, BroadcastElection])
        }
        (Candidate, ElectionReceived { from_higher: true }) => {
            Transition::to(Candidate, vec![BroadcastElection])
        }
        (Candidate, AnswerReceived { from_higher: true }) => {
            Transition::to(Normal, vec![ClearKnownLeader])
        }
        (Candidate, AnswerReceived { from_higher: false }) => {
            Transition::to(Candidate, vec![BroadcastElection])
        }
        (Candidate, CoordinatorReceived { .. }) => Transition::to(Normal, vec![AdoptSenderAsLeader]),
        (Candidate, WinElection) => {
            Transition::to(Leader, vec![BroadcastCoordinator, ClaimLeadership])
        }
        (Candidate, LeaderReset) => Transition::to(Candidate, vec![ClearKnownLeader]),

        (Leader, ElectionReceived { from_higher: false }) => {
            Transition::to(Leader, vec![BroadcastAnswer, BroadcastCoordinator])
        }
        (Leader, ElectionReceived { from_higher: true }) => Transition::stay(Leader),
        (Leader, AnswerReceived { .. }) => Transition::stay(Leader),
        (Leader, CoordinatorReceived { from_higher: true }) => {
            Transition::to(Normal, vec![AdoptSenderAsLeader])
        }
        (Leader, CoordinatorReceived { from_higher: false }) => {
            Transition::to(Leader, vec![BroadcastCoordinator])
        }
        (Leader, LeaderReset) => Transition::to(Normal, vec![ClearKnownLeader]),

        (role, event @ StartElection) | (role, event @ WinElection) => {
            return new_err(
                format!("Invalid election transition: {} while {}", event, role),
                String::new(),
            )
        }
    };

    Ok(transition)
}
