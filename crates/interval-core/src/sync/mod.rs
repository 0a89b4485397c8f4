//! Companion-device synchronization.
//!
//! The phone and the watch each run their own session. Either side pushes a
//! [`WorkoutSyncSnapshot`] over a [`CompanionTransport`]; the receiver
//! overwrites its local position and clock with it. Last received wins.

pub mod event_codec;
pub mod transport;
pub mod types;

#[cfg(test)]
mod event_codec_tests;
#[cfg(test)]
mod types_tests;

pub use event_codec::{decode_or_drop, payload_to_snapshot, snapshot_to_payload};
pub use transport::{CompanionTransport, InMemoryTransport, NullTransport, PayloadStream};
pub use types::{SyncMode, SyncPayload, WorkoutSyncSnapshot};
