// Library root: data model, error taxonomy, configuration, collaborator
// traits and the reconciliation engine.

pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod source;

pub use error::{ErrorKind, ScrimError};
pub use notify::{Dispatcher, MessageHandle, ScrimEvent};
pub use reconcile::{Reconciler, TickSummary};
pub use source::{ScrimActions, ScrimSource};
