//! 类型定义模块

mod settings;
mod token_policy;

pub use settings::{keys, Settings};
pub use token_policy::{TokenPolicy, DEFAULT_FORBIDDEN_TOKENS};
