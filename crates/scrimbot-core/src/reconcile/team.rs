// Own-team slot state machine. Slots use loose identity (time + format), so
// a change of opponent or open/booked state is an update to one tracked slot.

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::{Reconciler, TickSummary};
use crate::model::{Scrim, Slot};
use crate::notify::{Dispatcher, ScrimEvent};
use crate::source::ScrimSource;

/// `Booked` or `WildcardBooked`, depending on whether the opponent is known.
fn booked_event(scrim: Scrim) -> ScrimEvent {
    if scrim.opponent.is_wildcard() {
        ScrimEvent::WildcardBooked(scrim)
    } else {
        ScrimEvent::Booked(scrim)
    }
}

/// Drop scrims already handed to the played list or already past their
/// removal time, and keep only the first scrim per slot.
fn fresh_scrims(
    fetched: Vec<Scrim>,
    played: &std::collections::BTreeMap<Slot, Scrim>,
    now: NaiveDateTime,
) -> Vec<Scrim> {
    let mut seen = BTreeSet::new();
    fetched
        .into_iter()
        .filter(|s| !played.contains_key(&s.slot()))
        .filter(|s| now <= s.removal_time())
        .filter(|s| seen.insert(s.slot()))
        .collect()
}

impl<S: ScrimSource, D: Dispatcher> Reconciler<S, D> {
    pub(super) async fn reconcile_team(&mut self, now: NaiveDateTime, summary: &mut TickSummary) {
        self.expire_passed(now, summary).await;
        self.emit_played(now, summary).await;

        let fetched = match self.source.team_scrims(&self.team).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(team = %self.team, error = %e, "failed to fetch team scrims");
                summary.failures += 1;
                self.report("team scrims", &e.to_string()).await;
                return;
            }
        };
        let fresh = fresh_scrims(fetched, &self.state.played_scrims, now);
        let fresh_slots: BTreeSet<Slot> = fresh.iter().map(Scrim::slot).collect();
        debug!(count = fresh.len(), "fetched team scrims");

        for new in fresh {
            if let Some(old) = self.state.current_scrims.get(&new.slot()).cloned() {
                self.update_slot(old, new, summary).await;
            } else if let Some(old_slot) = self.moved_format(&new, &fresh_slots) {
                self.update_format(old_slot, new, summary).await;
            } else {
                let event = if new.open {
                    ScrimEvent::Created(new.clone())
                } else {
                    booked_event(new.clone())
                };
                info!(scrim = %new, "new scrim slot");
                self.install(event, new, summary).await;
            }
        }

        let gone: Vec<Slot> = self
            .state
            .current_scrims
            .keys()
            .filter(|slot| !fresh_slots.contains(slot))
            .copied()
            .collect();
        for slot in gone {
            let Some(old) = self.state.current_scrims.remove(&slot) else {
                continue;
            };
            info!(scrim = %old, "scrim slot withdrawn");
            self.drop_message(slot, summary).await;
            self.notify(ScrimEvent::CreatedCancelled(old), summary).await;
        }
    }

    // -----------------------------------------------------------------------
    // Time-driven transitions
    // -----------------------------------------------------------------------

    /// Slots past their removal time: open ones aged out unbooked, booked
    /// ones move to the played list (their message stays).
    async fn expire_passed(&mut self, now: NaiveDateTime, summary: &mut TickSummary) {
        let expired: Vec<Slot> = self
            .state
            .current_scrims
            .iter()
            .filter(|(_, scrim)| now > scrim.removal_time())
            .map(|(slot, _)| *slot)
            .collect();

        for slot in expired {
            let Some(scrim) = self.state.current_scrims.remove(&slot) else {
                continue;
            };
            if scrim.open {
                debug!(scrim = %scrim, "open request passed unbooked");
                self.drop_message(slot, summary).await;
                self.notify(ScrimEvent::RequestPassed(scrim), summary).await;
            } else {
                debug!(scrim = %scrim, "booked scrim started");
                self.state.played_scrims.insert(slot, scrim);
            }
        }
    }

    async fn emit_played(&mut self, now: NaiveDateTime, summary: &mut TickSummary) {
        let finished: Vec<Slot> = self
            .state
            .played_scrims
            .iter()
            .filter(|(_, scrim)| now > scrim.end_time())
            .map(|(slot, _)| *slot)
            .collect();

        for slot in finished {
            let Some(scrim) = self.state.played_scrims.remove(&slot) else {
                continue;
            };
            info!(scrim = %scrim, "scrim played");
            self.drop_message(slot, summary).await;
            self.notify(ScrimEvent::Played(scrim), summary).await;
        }
    }

    // -----------------------------------------------------------------------
    // Fetch-driven transitions
    // -----------------------------------------------------------------------

    /// Same slot seen again: compare open state, then opponent.
    async fn update_slot(&mut self, old: Scrim, new: Scrim, summary: &mut TickSummary) {
        let slot = new.slot();

        if old.open != new.open {
            if new.open {
                info!(old = %old, new = %new, "booking fell through, slot reopened");
                self.drop_message(slot, summary).await;
                self.notify(ScrimEvent::FoundCancelled(old), summary).await;
                self.install(ScrimEvent::Resent(new.clone()), new, summary)
                    .await;
            } else {
                info!(scrim = %new, "slot booked");
                self.install(booked_event(new.clone()), new, summary).await;
            }
            return;
        }

        if !new.open && old.opponent != new.opponent {
            if old.opponent.is_wildcard() {
                info!(scrim = %new, "wildcard opponent resolved");
                self.install(ScrimEvent::Booked(new.clone()), new, summary)
                    .await;
            } else if new.opponent.is_wildcard() {
                // A known opponent is kept over a later lookup miss.
                let mut carried = new;
                carried.opponent = old.opponent;
                self.state.current_scrims.insert(slot, carried);
            } else {
                info!(old = %old, new = %new, "booked opponent changed");
                self.drop_message(slot, summary).await;
                self.notify(ScrimEvent::FoundCancelled(old), summary).await;
                self.install(ScrimEvent::Booked(new.clone()), new, summary)
                    .await;
            }
            return;
        }

        self.state.current_scrims.insert(slot, new);
    }

    /// A tracked slot at the same start time that the fetch no longer
    /// reports: the scrim's format changed under it.
    fn moved_format(&self, new: &Scrim, fresh_slots: &BTreeSet<Slot>) -> Option<Slot> {
        self.state
            .current_scrims
            .keys()
            .find(|slot| slot.time == new.time && !fresh_slots.contains(slot))
            .copied()
    }

    async fn update_format(&mut self, old_slot: Slot, new: Scrim, summary: &mut TickSummary) {
        let Some(old) = self.state.current_scrims.remove(&old_slot) else {
            return;
        };
        self.drop_message(old_slot, summary).await;

        let mut new = new;
        if new.opponent.is_wildcard() && old.opponent.is_known() {
            new.opponent = old.opponent.clone();
        }
        info!(old = %old, new = %new, "scrim format changed");

        let wildcard = old.opponent.is_wildcard() || new.opponent.is_wildcard();
        let event = match (old.open, new.open) {
            (true, true) => ScrimEvent::Updated {
                old,
                new: new.clone(),
            },
            (false, true) => {
                self.notify(ScrimEvent::FoundCancelled(old), summary).await;
                ScrimEvent::Resent(new.clone())
            }
            (true, false) if wildcard => ScrimEvent::WildcardUpdatedBooked {
                old,
                new: new.clone(),
            },
            (true, false) => ScrimEvent::UpdatedBooked {
                old,
                new: new.clone(),
            },
            (false, false) if wildcard => ScrimEvent::WildcardBookedUpdated {
                old,
                new: new.clone(),
            },
            (false, false) => ScrimEvent::BookedUpdated {
                old,
                new: new.clone(),
            },
        };
        self.install(event, new, summary).await;
    }

    // -----------------------------------------------------------------------
    // Slot/message bookkeeping
    // -----------------------------------------------------------------------

    /// Track `scrim` under its slot and announce `event`, keeping the posted
    /// message as the slot's notification. Any earlier message for the slot
    /// is deleted first.
    async fn install(&mut self, event: ScrimEvent, scrim: Scrim, summary: &mut TickSummary) {
        let slot = scrim.slot();
        self.drop_message(slot, summary).await;
        self.state.current_scrims.insert(slot, scrim);
        if let Ok(Some(handle)) = self.announce(event, summary).await {
            self.state.scrim_messages.insert(slot, handle);
        }
    }

    async fn drop_message(&mut self, slot: Slot, summary: &mut TickSummary) {
        let handle = self.state.scrim_messages.remove(&slot);
        self.retract(handle, summary).await;
    }
}
