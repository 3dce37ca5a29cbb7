// Incoming/outgoing request diffing. Requests use exact identity: any change
// in opponent or state is a removal plus a new arrival.

use tracing::{debug, warn};

use super::{Reconciler, TickSummary, TrackedRequest};
use crate::error::ScrimError;
use crate::model::Scrim;
use crate::notify::{Dispatcher, ScrimEvent};
use crate::source::ScrimSource;

/// Which request list a pass reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Requests other teams sent us.
    Incoming,
    /// Requests we sent other teams.
    Outgoing,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }

    fn added(self, scrim: Scrim) -> ScrimEvent {
        match self {
            Direction::Incoming => ScrimEvent::RequestReceived(scrim),
            Direction::Outgoing => ScrimEvent::RequestSent(scrim),
        }
    }

    fn removed(self, scrim: Scrim) -> ScrimEvent {
        match self {
            Direction::Incoming => ScrimEvent::ReceivedRequestRemoved(scrim),
            Direction::Outgoing => ScrimEvent::SentRequestRemoved(scrim),
        }
    }
}

impl<S: ScrimSource, D: Dispatcher> Reconciler<S, D> {
    async fn fetch_requests(&self, direction: Direction) -> Result<Vec<Scrim>, ScrimError> {
        match direction {
            Direction::Incoming => self.source.incoming_requests().await,
            Direction::Outgoing => self.source.outgoing_requests().await,
        }
    }

    fn requests_mut(&mut self, direction: Direction) -> &mut Vec<TrackedRequest> {
        match direction {
            Direction::Incoming => &mut self.state.incoming,
            Direction::Outgoing => &mut self.state.outgoing,
        }
    }

    pub(super) async fn reconcile_requests(
        &mut self,
        direction: Direction,
        summary: &mut TickSummary,
    ) {
        let fetched = match self.fetch_requests(direction).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(direction = direction.label(), error = %e, "failed to fetch scrim requests");
                summary.failures += 1;
                self.report(&format!("{} requests", direction.label()), &e.to_string())
                    .await;
                return;
            }
        };
        debug!(
            direction = direction.label(),
            count = fetched.len(),
            "fetched scrim requests"
        );

        // Removals are judged against the previous snapshot before anything
        // new is tracked.
        let previous = std::mem::take(self.requests_mut(direction));
        let mut tracked = Vec::with_capacity(previous.len());
        for entry in previous {
            if fetched.iter().any(|s| s.equals_exact(&entry.scrim)) {
                tracked.push(entry);
                continue;
            }
            self.retract(entry.message, summary).await;
            self.notify(direction.removed(entry.scrim), summary).await;
        }

        for scrim in fetched {
            if tracked.iter().any(|t| t.scrim.equals_exact(&scrim)) {
                continue;
            }
            // Not tracked on failure, so the next tick retries it.
            if let Ok(message) = self.announce(direction.added(scrim.clone()), summary).await {
                tracked.push(TrackedRequest { scrim, message });
            }
        }

        *self.requests_mut(direction) = tracked;
    }
}
