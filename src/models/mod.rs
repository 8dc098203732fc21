pub mod config;
pub mod operation;
pub mod precedence;
pub mod proxy_config;
pub mod tool;

pub use config::*;
pub use operation::*;
pub use precedence::*;
pub use proxy_config::*;
pub use tool::*;
