//! REST API handlers organized by domain.

pub mod health;
pub mod proofs;
pub mod verify;

pub use health::*;
pub use proofs::*;
pub use verify::*;
