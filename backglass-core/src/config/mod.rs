//! Machine config loading and schema validation.

mod loader;
mod types;
mod validator;

pub use loader::ConfigLoader;
pub use types::*;
pub use validator::{parse_color, parse_time, ConfigValidator};
