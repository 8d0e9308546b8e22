//! Presence tracking
//!
//! - `coordinator`: Snapshot ownership and the refresh cycle
//! - `sync`: Background refresh loop
//! - `projection`: Read-time derived values and consumer views

pub mod coordinator;
pub mod projection;
pub mod sync;

pub use coordinator::PresenceCoordinator;
pub use sync::PresenceSyncer;
