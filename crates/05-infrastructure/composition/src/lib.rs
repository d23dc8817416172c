//! # 基础设施组合层
//!
//! 将配置存储、组件注册表和定时任务调度器组合成一个可运行的应用上下文。
//!
//! ## 主要功能
//!
//! - **应用上下文构建器**: 使用建造者模式组装配置来源与组件
//! - **组件扫描发现**: 按模块路径发现 `#[derive(Component)]` 组件
//! - **定时任务**: 固定延迟的周期性方法调用
//! - **生命周期管理**: 关闭时停止调度器并销毁已构建的组件
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::ApplicationContext;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = ApplicationContext::new("my_app::services", Some(Path::new("app.yaml"))).await?;
//!
//!     let retries: i32 = context.get_config_value("retries")?;
//!     println!("重试次数: {}", retries);
//!
//!     context.close().await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod context;
pub mod scheduler;
pub mod shutdown;

pub use builder::ApplicationContextBuilder;
pub use context::{ApplicationContext, ContextOptions};
pub use scheduler::{validate_schedules, ScheduledActivity, SchedulerState, TaskScheduler};
pub use shutdown::{install_shutdown_hook, wait_for_shutdown_signal};

#[cfg(test)]
#[path = "tests/integration_tests.rs"]
mod integration_tests;
