//! # ember-engine
//!
//! The local-first synchronization engine for the Ember matchmaking app.
//!
//! Swipes, messages, and read receipts always succeed against the on-device
//! store first; a background orchestrator reconciles them with the remote
//! service whenever connectivity allows.
//!
//! ## Architecture
//!
//! ```text
//! UI ──► SyncEngine (gateway) ──► LocalStore          (always)
//!              │                      ▲
//!              │ fire-and-forget      │ bulk upserts
//!              ▼                      │
//!        sync orchestrator ──► RemoteClient ──► backend
//!              ▲
//!              │ offline→online edge
//!        NetworkMonitor
//! ```
//!
//! The engine is an explicit context object: the composition root builds one
//! from a store, a remote client, and a network monitor, and tests run many
//! isolated instances side by side.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod network;
pub mod orchestrator;
pub mod remote;

pub use engine::{EngineConfig, EngineError, OfflineStats, SyncEngine};
pub use network::{NetworkEvent, NetworkMonitor};
pub use orchestrator::SyncReport;
pub use remote::{HttpRemote, MockRemote, RemoteClient, RemoteError};
