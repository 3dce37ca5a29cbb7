// Reconciliation engine: diffs freshly fetched scrim state against what was
// seen last tick and emits one event per transition.

mod requests;
mod team;

use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::model::{Scrim, Slot, Team};
use crate::notify::{Dispatcher, MessageHandle, ScrimEvent};
use crate::source::ScrimSource;

pub use requests::Direction;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A request notification: the request as last seen, and the message
/// announcing it (if the dispatcher posted one).
#[derive(Debug, Clone)]
pub struct TrackedRequest {
    pub scrim: Scrim,
    pub message: Option<MessageHandle>,
}

/// Everything the engine remembers between ticks. Lives in memory only; a
/// restart rebuilds it from the next fetch.
///
/// `scrim_messages` is keyed by the same slots as `current_scrims` and
/// `played_scrims` together; a slot may lack a message when its announcement
/// failed or posted nothing.
#[derive(Debug, Clone, Default)]
pub struct ReconcileState {
    pub current_scrims: BTreeMap<Slot, Scrim>,
    pub scrim_messages: BTreeMap<Slot, MessageHandle>,
    pub played_scrims: BTreeMap<Slot, Scrim>,
    pub incoming: Vec<TrackedRequest>,
    pub outgoing: Vec<TrackedRequest>,
}

/// Counters for one tick, logged when it completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Events the dispatcher accepted.
    pub events: usize,
    /// Swallowed failures: fetches, announcements and retractions.
    pub failures: usize,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Owns the collaborators and the tracked state. Ticks take `&mut self`, so a
/// tick can never start while another is in flight.
pub struct Reconciler<S, D> {
    source: S,
    dispatcher: D,
    team: Team,
    state: ReconcileState,
}

impl<S: ScrimSource, D: Dispatcher> Reconciler<S, D> {
    pub fn new(source: S, dispatcher: D, team: Team) -> Self {
        Self {
            source,
            dispatcher,
            team,
            state: ReconcileState::default(),
        }
    }

    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    /// Run all three passes against the current local wall-clock time.
    pub async fn tick(&mut self) -> TickSummary {
        self.tick_at(Local::now().naive_local()).await
    }

    /// Run incoming requests, outgoing requests, then own-team scrims, in
    /// that order. A failure inside one pass never stops the others.
    pub async fn tick_at(&mut self, now: NaiveDateTime) -> TickSummary {
        let mut summary = TickSummary::default();

        self.reconcile_requests(Direction::Incoming, &mut summary).await;
        self.reconcile_requests(Direction::Outgoing, &mut summary).await;
        self.reconcile_team(now, &mut summary).await;

        if summary.failures > 0 {
            warn!(
                events = summary.events,
                failures = summary.failures,
                tracked = self.state.current_scrims.len(),
                played = self.state.played_scrims.len(),
                "tick completed with failures"
            );
        } else {
            info!(
                events = summary.events,
                tracked = self.state.current_scrims.len(),
                played = self.state.played_scrims.len(),
                "tick completed"
            );
        }
        summary
    }

    // -----------------------------------------------------------------------
    // Fault-isolated dispatcher calls
    // -----------------------------------------------------------------------

    /// Hand `event` to the dispatcher. Failures are logged, counted and
    /// reported, then returned so the caller can decide what to track.
    async fn announce(
        &self,
        event: ScrimEvent,
        summary: &mut TickSummary,
    ) -> anyhow::Result<Option<MessageHandle>> {
        debug!(event = %event, "dispatching");
        match self.dispatcher.announce(&event).await {
            Ok(handle) => {
                summary.events += 1;
                Ok(handle)
            }
            Err(e) => {
                warn!(event = %event, error = %e, "failed to announce event");
                summary.failures += 1;
                self.report("announce", &format!("{event}: {e:#}")).await;
                Err(e)
            }
        }
    }

    /// Announce an event whose message is not tracked afterwards.
    async fn notify(&self, event: ScrimEvent, summary: &mut TickSummary) {
        let _ = self.announce(event, summary).await;
    }

    async fn retract(&self, handle: Option<MessageHandle>, summary: &mut TickSummary) {
        let Some(handle) = handle else {
            return;
        };
        if let Err(e) = self.dispatcher.retract(&handle).await {
            warn!(message = %handle, error = %e, "failed to delete notification");
            summary.failures += 1;
            self.report("retract", &format!("message {handle}: {e:#}")).await;
        }
    }

    async fn report(&self, context: &str, error: &str) {
        if let Err(e) = self.dispatcher.report_failure(context, error).await {
            debug!(context, error = %e, "failed to report failure");
        }
    }
}
