//! The interpreter engine: tree parser, scope tracker, pending-ops
//! scheduler, and the sweep-driving evaluator.

pub mod evaluator;
pub mod parser;
pub mod scheduler;
pub mod scope;

pub use evaluator::Evaluator;
pub use scheduler::{OpPriority, PendingOps};
pub use scope::ScopeTracker;
