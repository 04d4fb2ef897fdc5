//! Function-calling chat agent
//!
//! - `builder`: fluent construction of a [`ChatAgent`]
//! - `runtime`: the history and tool loop

pub mod builder;
pub mod runtime;

pub use builder::{ChatAgentBuilder, DEFAULT_MAX_ITERATIONS};
pub use runtime::ChatAgent;
