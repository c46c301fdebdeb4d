//! Experimentation: bucketing, targeting, sandboxed variants, flags and analysis.

pub mod analysis;
pub mod bucketing;
pub mod engine;
pub mod store;
pub mod targeting;
pub mod transform;

pub use analysis::{calculate_sample_size, ExperimentResults, StatisticalTest};
pub use bucketing::{bucket_for, hash_string};
pub use engine::{generate_session_id, AssignedVariant, ExperimentEngine, MultivariateRequest, Preview};
pub use store::{AssignmentStore, InMemoryAssignmentStore};
pub use targeting::UserContext;
pub use transform::{Document, Element, Transform};
