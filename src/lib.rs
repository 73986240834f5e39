pub mod clock;
pub mod config;
pub mod executor;
pub mod extract;
pub mod model;
pub mod present;
pub mod runner;
pub mod session;
pub mod traits;
pub mod validate;

// Re-export common types for convenience
pub use config::*;
pub use executor::*;
pub use model::*;
pub use traits::*;
pub use validate::{RunForm, DEFAULT_CONFIG_TEXT};
