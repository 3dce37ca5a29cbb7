// Client for the external scrim scheduling service.

mod client;
pub mod wire;

pub use client::{GanksterClient, DEFAULT_BASE_URL};
