//! Abstract browser capability set
//!
//! The executor drives exploration through this trait only; no automation
//! product's API shape leaks into the core. A concrete adapter (CDP,
//! WebDriver, ...) lives outside this workspace.

pub mod driver;
pub mod errors;
pub mod types;

pub use driver::BrowserDriver;
pub use errors::DriverError;
pub use types::{
    ConsoleEntry, ElementHandle, NavigateOptions, NetworkEntry, WaitCondition, WaitState,
};
