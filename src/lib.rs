pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod serialize;
pub mod sheet;
pub mod sync;

pub use config::SyncConfig;
pub use error::{CommitProgress, SyncError, SyncResult, SyncStep};
pub use sync::{CommitOutcome, SyncOrchestrator};
