pub mod api;
pub mod config;
pub mod definitions;
pub mod document;
pub mod engine;
pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod providers;
pub mod review;
pub mod storage;
pub mod tools;
pub mod types;

pub use config::Config;
pub use error::{SowError, SowResult};
pub use types::*;
