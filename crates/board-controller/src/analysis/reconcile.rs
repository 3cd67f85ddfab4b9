//! Response-ordering guard for overlapping requests.
//!
//! Every request gets a ticket with a monotonically increasing sequence
//! number and, for position-bound calls, the FEN it was issued for. A
//! response is applied only if its ticket is the latest one issued and the
//! board still shows that FEN.

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub seq: u64,
    /// FEN the request was issued for; `None` for position-independent calls
    pub position_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// A newer request has been issued since
    Superseded { latest: u64 },
    /// The board moved on since the request was issued
    PositionChanged,
    /// Nothing has been issued by this reconciler
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Accepted,
    Stale(StaleReason),
}

impl Reconciled {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Reconciled::Accepted)
    }
}

#[derive(Debug, Default)]
pub struct Reconciler {
    latest_seq: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for the given position; supersedes all earlier ones.
    pub fn issue(&mut self, position_key: Option<String>) -> Ticket {
        self.latest_seq += 1;
        Ticket {
            seq: self.latest_seq,
            position_key,
        }
    }

    /// Decide whether a response carrying `ticket` may touch the display.
    pub fn check(&self, ticket: &Ticket, current_key: &str) -> Reconciled {
        if self.latest_seq == 0 || ticket.seq > self.latest_seq {
            return Reconciled::Stale(StaleReason::Unknown);
        }

        if ticket.seq != self.latest_seq {
            debug!(seq = ticket.seq, latest = self.latest_seq, "Superseded response");
            return Reconciled::Stale(StaleReason::Superseded {
                latest: self.latest_seq,
            });
        }

        match &ticket.position_key {
            Some(key) if key != current_key => {
                debug!(seq = ticket.seq, "Response for a position no longer shown");
                Reconciled::Stale(StaleReason::PositionChanged)
            }
            _ => Reconciled::Accepted,
        }
    }
}
