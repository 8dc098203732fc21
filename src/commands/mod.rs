// 调用方可见的操作
//
// 每个函数对应一个对外操作，返回可序列化的结果；
// 按 ID 查询单个工具时，未知 ID 以 `Err(String)` 返回

pub mod npm_commands;
pub mod proxy_commands;
pub mod state;
pub mod tool_commands;

pub use npm_commands::*;
pub use proxy_commands::*;
pub use state::AppState;
pub use tool_commands::*;
