//! # Component Macros
//!
//! 这个 crate 提供了在编译时生成组件定义并在程序启动时自动登记的过程宏。
//!
//! ## 核心宏
//!
//! - [`Component`](derive@Component) - 生成 `ComponentDefinition` 并登记到全局组件表
//! - [`ConfigEnum`](derive@ConfigEnum) - 让枚举可以从配置值注入
//!
//! 生成的代码使用 `ctor` 登记，使用方需要依赖 `ctor` 与 `infrastructure-common`。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::{Component, ConfigEnum};
//! use infrastructure_common::BoxError;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, PartialEq, ConfigEnum)]
//! pub enum Mode {
//!     Fast,
//!     Slow,
//! }
//!
//! #[derive(Component)]
//! #[component(post_construct = "init", scheduled(method = "flush", fixed_delay = 5, unit = "seconds"))]
//! pub struct OrderService {
//!     #[inject]
//!     repository: Arc<OrderRepository>,
//!     #[value("orders.mode")]
//!     mode: Mode,
//!     #[value("orders.label")]
//!     label: Option<String>,
//! }
//!
//! impl OrderService {
//!     fn init(&mut self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//!
//!     fn flush(&self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod component;
mod config_enum;
mod utils;

/// 组件派生宏
///
/// 为结构体实现 `Component` trait，并在程序启动时按 `module_path!()` 登记到全局组件表。
///
/// # 结构体参数 `#[component(..)]`
///
/// - `lazy` - 延迟组件，首次获取时才构建
/// - `post_construct = "method"` - 构造后钩子，签名 `fn(&mut self) -> Result<(), E>`，可重复
/// - `pre_destroy = "method"` - 销毁前钩子，签名 `fn(&self) -> Result<(), E>`，可重复
/// - `scheduled(method = "m", fixed_delay = N, initial_delay = N, unit = "seconds")` -
///   定时方法，签名 `fn(&self) -> Result<(), E>`，单位缺省为毫秒
///
/// `E` 需要能转换为 `BoxError`。
///
/// # 字段属性
///
/// - `#[inject]` - 注入组件，字段类型为 `Arc<T>`
/// - `#[value("key")]` - 注入配置值，字段类型为 `Option<V>` 时键可以不存在
///
/// 未标注的字段使用 `Default::default()`。
///
/// # 限制
///
/// 派生出的钩子不带参数，也无法声明父类型的钩子层。需要钩子参数注入
/// （`Requirement::component`/`Requirement::value`）或 `extends(..)` 继承链时，
/// 手工实现 `Component` 并使用 `ComponentDefinition::builder` 的
/// `post_construct(name, requirements, ..)`、`pre_destroy(..)` 与 `extends(..)`。
#[proc_macro_derive(Component, attributes(component, inject, value))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::derive_component_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 配置枚举派生宏
///
/// 为无字段枚举实现 `ConfigEnum`，并在程序启动时登记其转换函数。
/// 常量名称缺省为变体名的大写蛇形形式（`SlowStart` → `SLOW_START`），
/// 可用 `#[config_enum(name = "..")]` 覆盖。
#[proc_macro_derive(ConfigEnum, attributes(config_enum))]
pub fn derive_config_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    config_enum::derive_config_enum_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
