pub mod builtins;
pub mod context;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod inspect;
pub mod runtime_value;
pub mod session;

pub use error::RuntimeError;
pub use inspect::{Inspect, Render, inspect};
pub use runtime_value::RuntimeValue;
pub use session::Session;
