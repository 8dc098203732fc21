pub mod command;
pub mod config;
pub mod file_helpers;

pub use command::*;
pub use config::*;
pub use file_helpers::{dir_size, ensure_dir, format_size};
