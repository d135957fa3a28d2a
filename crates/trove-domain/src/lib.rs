//! Trove Domain Layer
//!
//! This crate holds the data model behind Trove's provenance tracking. It has
//! no filesystem access; persistence lives in `trove-store`.
//!
//! ## Key Concepts
//!
//! - **DataValue**: the payload a chain carries (text, table, structured object)
//! - **Transform**: a named, versioned transformation registered by the caller
//! - **TransformRecord**: one applied step with its tag, timestamp, lineage hash,
//!   code text and parameters
//! - **ProvenanceChain**: the ordered records plus the current value; branching
//!   copies the chain, it never mutates a shared one
//! - **LineageSource**: where lineage hashes come from (git, a fixed value, nothing)
//!
//! ## Replay
//!
//! Closures are never serialized. A record persists a [`TransformRef`]
//! (name + version) and replay resolves it against a caller-supplied
//! [`TransformRegistry`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod error;
pub mod lineage;
pub mod record;
pub mod transform;
pub mod value;

// Re-exports for convenience
pub use chain::{Invocation, ProvenanceChain};
pub use error::{ChainError, Result};
pub use lineage::{LineagePolicy, LineageSource, LineageState, NoLineage, StaticLineage, NO_LINEAGE_HASH};
pub use record::{RecordInfo, RecordOrigin, StepId, Timestamp, TransformRecord};
pub use transform::{Transform, TransformError, TransformRef, TransformRegistry};
pub use value::{DataValue, Parameters, Table};
