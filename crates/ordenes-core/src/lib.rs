pub mod area;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod io;
pub mod order;
pub mod paths;
pub mod report;
pub mod store;
pub mod timer;
pub mod transition;
pub mod types;

pub use error::{OrdenesError, Result};
