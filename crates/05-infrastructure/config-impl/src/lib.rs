//! # Configuration Implementation
//!
//! 配置来源与配置存储的具体实现。
//!
//! ## 主要组件
//!
//! - [`PropertiesConfigLoader`] / [`JsonConfigLoader`] / [`YamlConfigLoader`] / [`TomlConfigLoader`] - 各格式加载器
//! - [`ConfigLoaderFactory`] - 按扩展名选择加载器
//! - [`ConfigStore`] - 带类型转换的只读配置存储

pub mod factory;
pub mod providers;
pub mod store;

pub use factory::*;
pub use providers::*;
pub use store::*;
