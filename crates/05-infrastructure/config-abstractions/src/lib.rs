//! # Configuration Abstractions
//!
//! 配置抽象层，定义配置来源与类型化查找的核心接口。
//!
//! ## 核心接口
//!
//! - [`ConfigLoader`] - 从单个配置文件产生扁平化键值映射
//! - [`ConfigFormat`] - 按扩展名选择配置格式
//! - [`ConfigResolver`] - 按键和目标类型查找配置值

pub mod provider;
pub mod resolver;

pub use provider::*;
pub use resolver::*;
