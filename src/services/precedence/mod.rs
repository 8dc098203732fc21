// 分层配置分析模块
//
// 判断配置值来自环境变量、user 层、global 层还是默认值，并提供修复操作

pub mod resolver;

pub use resolver::{PrecedenceResolver, PrecedenceSettings, GLOBAL_CLEANUP_KEYS, PIN_SETTLE_DELAY};
