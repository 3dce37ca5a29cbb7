// Events the engine emits and the dispatcher capability that renders them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Scrim;

/// Where a posted notification lives, so it can be deleted later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub channel: String,
    pub id: String,
}

impl MessageHandle {
    pub fn new(channel: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.id)
    }
}

/// One observed transition. Variants that describe a change to a tracked slot
/// carry both the previous and the new scrim.
#[derive(Debug, Clone)]
pub enum ScrimEvent {
    // Own-team slot lifecycle
    Created(Scrim),
    Booked(Scrim),
    WildcardBooked(Scrim),
    FoundCancelled(Scrim),
    CreatedCancelled(Scrim),
    Resent(Scrim),
    Played(Scrim),
    RequestPassed(Scrim),
    // Own-team slot whose format changed under the same start time
    Updated { old: Scrim, new: Scrim },
    UpdatedBooked { old: Scrim, new: Scrim },
    WildcardUpdatedBooked { old: Scrim, new: Scrim },
    BookedUpdated { old: Scrim, new: Scrim },
    WildcardBookedUpdated { old: Scrim, new: Scrim },
    // Request lists
    RequestReceived(Scrim),
    ReceivedRequestRemoved(Scrim),
    RequestSent(Scrim),
    SentRequestRemoved(Scrim),
}

impl ScrimEvent {
    /// Stable snake_case name, used in logs and the ledger.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrimEvent::Created(_) => "created",
            ScrimEvent::Booked(_) => "booked",
            ScrimEvent::WildcardBooked(_) => "wildcard_booked",
            ScrimEvent::FoundCancelled(_) => "found_cancelled",
            ScrimEvent::CreatedCancelled(_) => "created_cancelled",
            ScrimEvent::Resent(_) => "resent",
            ScrimEvent::Played(_) => "played",
            ScrimEvent::RequestPassed(_) => "request_passed",
            ScrimEvent::Updated { .. } => "updated",
            ScrimEvent::UpdatedBooked { .. } => "updated_booked",
            ScrimEvent::WildcardUpdatedBooked { .. } => "wildcard_updated_booked",
            ScrimEvent::BookedUpdated { .. } => "booked_updated",
            ScrimEvent::WildcardBookedUpdated { .. } => "wildcard_booked_updated",
            ScrimEvent::RequestReceived(_) => "request_received",
            ScrimEvent::ReceivedRequestRemoved(_) => "received_request_removed",
            ScrimEvent::RequestSent(_) => "request_sent",
            ScrimEvent::SentRequestRemoved(_) => "sent_request_removed",
        }
    }

    /// The scrim the event is about; the new side for update variants.
    pub fn scrim(&self) -> &Scrim {
        match self {
            ScrimEvent::Created(s)
            | ScrimEvent::Booked(s)
            | ScrimEvent::WildcardBooked(s)
            | ScrimEvent::FoundCancelled(s)
            | ScrimEvent::CreatedCancelled(s)
            | ScrimEvent::Resent(s)
            | ScrimEvent::Played(s)
            | ScrimEvent::RequestPassed(s)
            | ScrimEvent::RequestReceived(s)
            | ScrimEvent::ReceivedRequestRemoved(s)
            | ScrimEvent::RequestSent(s)
            | ScrimEvent::SentRequestRemoved(s) => s,
            ScrimEvent::Updated { new, .. }
            | ScrimEvent::UpdatedBooked { new, .. }
            | ScrimEvent::WildcardUpdatedBooked { new, .. }
            | ScrimEvent::BookedUpdated { new, .. }
            | ScrimEvent::WildcardBookedUpdated { new, .. } => new,
        }
    }

    /// The previous scrim for update variants.
    pub fn previous(&self) -> Option<&Scrim> {
        match self {
            ScrimEvent::Updated { old, .. }
            | ScrimEvent::UpdatedBooked { old, .. }
            | ScrimEvent::WildcardUpdatedBooked { old, .. }
            | ScrimEvent::BookedUpdated { old, .. }
            | ScrimEvent::WildcardBookedUpdated { old, .. } => Some(old),
            _ => None,
        }
    }

    /// Events that only clear an earlier notification and post nothing new.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            ScrimEvent::RequestPassed(_)
                | ScrimEvent::ReceivedRequestRemoved(_)
                | ScrimEvent::SentRequestRemoved(_)
        )
    }

    /// Events that leave the scrim booked against an opponent.
    pub fn is_booking(&self) -> bool {
        matches!(
            self,
            ScrimEvent::Booked(_)
                | ScrimEvent::WildcardBooked(_)
                | ScrimEvent::UpdatedBooked { .. }
                | ScrimEvent::WildcardUpdatedBooked { .. }
                | ScrimEvent::BookedUpdated { .. }
                | ScrimEvent::WildcardBookedUpdated { .. }
        )
    }
}

impl fmt::Display for ScrimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.previous() {
            Some(old) => write!(f, "{}: {} -> {}", self.kind(), old, self.scrim()),
            None => write!(f, "{}: {}", self.kind(), self.scrim()),
        }
    }
}

/// Renders events into outward notifications.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Post the rendering of `event`. Returns the handle of the posted
    /// message, or `None` when nothing was posted.
    async fn announce(&self, event: &ScrimEvent) -> anyhow::Result<Option<MessageHandle>>;

    /// Delete a message returned by an earlier `announce`.
    async fn retract(&self, handle: &MessageHandle) -> anyhow::Result<()>;

    /// Surface a failure from the automatic tick path to an operator.
    async fn report_failure(&self, context: &str, error: &str) -> anyhow::Result<()> {
        let _ = (context, error);
        Ok(())
    }
}
