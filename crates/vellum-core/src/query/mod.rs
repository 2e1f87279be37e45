//! Query translation.
//!
//! Turns a user search specification into either a server filter descriptor
//! or a client-side execution strategy, plus the value coercion rules shared
//! by both.

pub mod model;
pub mod plan;

pub use model::{SearchOperator, SearchSpec};
pub use plan::QueryPlan;
