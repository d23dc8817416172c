//! # 依赖注入具体实现
//!
//! 提供组件注册表、依赖注入器、生命周期管理器和组件发现器的实现
//!
//! - [`ComponentRegistryImpl`] - 单例组件注册表，首次访问时构建
//! - [`Injector`] - 构造函数选择、参数解析与字段注入
//! - [`LifecycleManager`] - 构造后与销毁前钩子
//! - [`GlobalComponentDiscovery`] / [`StaticComponentDiscovery`] - 组件发现

pub mod discovery;
pub mod injector;
pub mod lifecycle;
pub mod registry;

pub use discovery::*;
pub use injector::*;
pub use lifecycle::*;
pub use registry::*;
