//! Infrastructure: error taxonomy, store trait, database backends, and
//! background machinery.

mod error;
mod expiry;
pub mod postgres;
mod shutdown;
pub mod sqlite;
mod traits;

pub use error::{ProofError, Result};
pub use expiry::ExpirySweeper;
pub use postgres::PgProofStore;
pub use shutdown::{shutdown_channel, ShutdownController, ShutdownSignal};
pub use sqlite::SqliteProofStore;
pub use traits::{ProofStore, VerificationUpdate};

#[cfg(test)]
pub use traits::MockProofStore;
