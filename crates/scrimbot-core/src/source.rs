// Capabilities the engine and the command surface need from the scheduling
// service.

use async_trait::async_trait;

use crate::error::ScrimError;
use crate::model::{Scrim, Team};

/// Read side: the three lists each tick reconciles against.
#[async_trait]
pub trait ScrimSource: Send + Sync {
    /// Open requests other teams have sent us; opponent populated.
    async fn incoming_requests(&self) -> Result<Vec<Scrim>, ScrimError>;

    /// Open requests we have sent to other teams; opponent populated.
    async fn outgoing_requests(&self) -> Result<Vec<Scrim>, ScrimError>;

    /// Every open and booked slot on `team`'s public schedule. Booked
    /// opponents are resolved only when `team` is the tracked team; otherwise
    /// they come back as [`crate::model::Opponent::Wildcard`].
    async fn team_scrims(&self, team: &Team) -> Result<Vec<Scrim>, ScrimError>;
}

/// Write side, used by the command surface. Every call identifies its target
/// by time and format (and opponent where relevant) and fails with
/// [`crate::error::ErrorKind::ScrimNotFound`] when nothing matches remotely.
#[async_trait]
pub trait ScrimActions: Send + Sync {
    /// Post a new open slot at `scrim.time` in `scrim.format`.
    async fn create_request(&self, scrim: &Scrim) -> Result<(), ScrimError>;

    /// Withdraw our open slot at the same time and format.
    async fn cancel_request(&self, scrim: &Scrim) -> Result<(), ScrimError>;

    /// Accept or decline a request received from `scrim.opponent`.
    async fn respond_to_request(&self, scrim: &Scrim, accept: bool) -> Result<(), ScrimError>;

    /// Cancel a confirmed booking against `scrim.opponent`.
    async fn cancel_booking(&self, scrim: &Scrim, reason: &str) -> Result<(), ScrimError>;

    /// Ask `scrim.opponent` to fill their open slot at that time and format.
    async fn send_request(&self, scrim: &Scrim) -> Result<(), ScrimError>;
}
