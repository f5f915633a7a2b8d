// core.rs splits responsibilities into submodules for easier maintenance.
pub mod chain;
pub mod registry;
pub mod validation;

pub use chain::*;
pub use registry::*;
pub use validation::*;
