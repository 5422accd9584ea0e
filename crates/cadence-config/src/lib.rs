//! # Cadence Config
//!
//! Scheduler configuration: schema with serde defaults, TOML loader with
//! environment expansion, fail-fast validation, and the parser that turns
//! the polymorphic `every` / `schedule` sections into a flat ordered
//! sequence of scheduling intents.

pub mod error;
pub mod intent;
pub mod loader;
pub mod parser;
pub mod schema;

pub use error::ConfigError;
pub use intent::{IntentKind, ScheduleIntent};
pub use loader::ConfigLoader;
pub use parser::parse;
pub use schema::SchedulerOptions;
