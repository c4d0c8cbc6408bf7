//! Cloud sync: reconcile the local ledger with the remote store
//!
//! ```text
//! SyncWorker (trigger: interval / on demand, retry with backoff)
//!   └── SyncEngine
//!         ├── push_local        pending sales + payments → remote
//!         ├── publish_directory villages/customers/products/agents → remote (owner)
//!         └── pull_remote       remote → local, all six collections
//! RemoteStore: HttpRemoteStore (ledger-cloud) | MemoryRemoteStore
//! ```

pub mod codec;
mod engine;
mod http;
mod memory;
mod remote;
mod worker;

pub use engine::{PullReport, PushReport, RecordFailure, SyncEngine, SyncReport};
pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;
pub use remote::{RemoteError, RemoteStore};
pub use worker::{SyncTrigger, SyncWorker};
