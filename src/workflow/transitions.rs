use crate::api::TicketStatus;

/// Which status moves the engine accepts before asking the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any status to any status.
    #[default]
    Complete,
    /// Reopening goes through IN_PROGRESS; CLOSED tickets cannot jump straight back to OPEN.
    Guided,
}

impl TransitionPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { TransitionPolicy::Guided } else { TransitionPolicy::Complete }
    }

    pub fn allows(&self, from: TicketStatus, to: TicketStatus) -> bool {
        if from == to {
            return true;
        }
        match self {
            TransitionPolicy::Complete => true,
            TransitionPolicy::Guided => guided_targets(from).contains(&to),
        }
    }
}

fn guided_targets(from: TicketStatus) -> &'static [TicketStatus] {
    use TicketStatus::*;
    match from {
        Open => &[InProgress, Waiting, Resolved, Closed],
        InProgress => &[Waiting, Resolved, Open],
        Waiting => &[InProgress, Resolved, Open],
        Resolved => &[Closed, InProgress],
        Closed => &[InProgress],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_graph_allows_every_pair() {
        for from in TicketStatus::ALL {
            for to in TicketStatus::ALL {
                assert!(TransitionPolicy::Complete.allows(from, to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn guided_graph() {
        let g = TransitionPolicy::Guided;
        assert!(g.allows(TicketStatus::Open, TicketStatus::Closed));
        assert!(g.allows(TicketStatus::Resolved, TicketStatus::Closed));
        assert!(g.allows(TicketStatus::Closed, TicketStatus::InProgress));
        assert!(!g.allows(TicketStatus::Closed, TicketStatus::Open));
        assert!(!g.allows(TicketStatus::Resolved, TicketStatus::Open));
        assert!(!g.allows(TicketStatus::Waiting, TicketStatus::Closed));
        for s in TicketStatus::ALL {
            assert!(g.allows(s, s));
        }
    }

    #[test]
    fn strict_flag_selects_policy() {
        assert_eq!(TransitionPolicy::from_strict(false), TransitionPolicy::Complete);
        assert_eq!(TransitionPolicy::from_strict(true), TransitionPolicy::Guided);
    }
}
