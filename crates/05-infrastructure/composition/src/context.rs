//! 应用上下文
//!
//! 持有配置存储、组件注册表和定时任务调度器，负责启动时的装配与关闭时的销毁。

use crate::builder::ApplicationContextBuilder;
use crate::scheduler::{ScheduledActivity, TaskScheduler};
use config_abstractions::ConfigResolverExt;
use config_impl::ConfigStore;
use di_abstractions::{ComponentRegistry, ComponentRegistryExt};
use di_impl::ComponentRegistryImpl;
use infrastructure_common::{
    ConfigError, DependencyError, InfrastructureError, LifecycleState, TypeInfo,
};
use std::any::TypeId;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 上下文运行参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// 定时任务工作池大小
    pub pool_size: usize,
    /// 关闭时等待正在执行的定时任务的时间
    pub shutdown_grace: Duration,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            pool_size: std::thread::available_parallelism().map_or(1, |n| n.get()),
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

/// 应用上下文
///
/// 所有组件都是单例。非延迟组件和拥有定时方法的组件在启动时构建，
/// 其余组件在首次获取时构建。
pub struct ApplicationContext {
    config: Arc<ConfigStore>,
    registry: Arc<ComponentRegistryImpl>,
    scheduler: TaskScheduler,
    options: ContextOptions,
    closed: AtomicBool,
}

impl ApplicationContext {
    /// 扫描指定模块路径下的组件并加载可选的配置文件
    pub async fn new(scan_root: &str, config_path: Option<&Path>) -> Result<Self, InfrastructureError> {
        let mut builder = Self::builder().scan(scan_root);
        if let Some(path) = config_path {
            builder = builder.config_file(path);
        }
        builder.build().await
    }

    /// 创建上下文构建器
    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
    }

    /// 由构建器装配完成后启动
    pub(crate) fn start(
        config: Arc<ConfigStore>,
        registry: Arc<ComponentRegistryImpl>,
        options: ContextOptions,
    ) -> Result<Self, InfrastructureError> {
        let scheduler = TaskScheduler::new(options.pool_size, options.shutdown_grace);
        let context = Self {
            config,
            registry,
            scheduler,
            options,
            closed: AtomicBool::new(false),
        };

        if let Err(e) = context.scheduler.start(&context.registry) {
            warn!("上下文启动失败，回收已构建的组件: {}", e);
            context.closed.store(true, Ordering::SeqCst);
            context.scheduler.stop_now();
            context.teardown();
            return Err(e);
        }

        info!(
            "应用上下文已启动: {} 个组件, {} 个定时任务",
            context.registry.len(),
            context.scheduler.activities().len()
        );
        Ok(context)
    }

    /// 获取组件，未注册时返回 `ComponentNotRegistered`
    pub fn get_component<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DependencyError> {
        self.registry.get::<T>()
    }

    /// 获取组件，未注册时返回 `None`
    ///
    /// 已注册组件的构建失败仍然返回错误。
    pub fn find_component<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, DependencyError> {
        self.registry.find::<T>()
    }

    /// 获取配置值，键不存在时返回 `KeyNotFound`
    pub fn get_config_value<V: Send + Sync + 'static>(&self, key: &str) -> Result<V, ConfigError> {
        self.config.require::<V>(key)
    }

    /// 获取配置值，键不存在时返回 `None`
    pub fn find_config_value<V: Send + Sync + 'static>(&self, key: &str) -> Result<Option<V>, ConfigError> {
        self.config.resolve::<V>(key)
    }

    /// 类型是否已注册
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.registry.is_registered::<T>()
    }

    /// 组件的生命周期状态
    pub fn component_state<T: 'static>(&self) -> Option<LifecycleState> {
        self.registry.state(TypeId::of::<T>())
    }

    /// 所有已注册的组件类型，按注册顺序
    pub fn registered_components(&self) -> Vec<TypeInfo> {
        self.registry.registered_types()
    }

    /// 已注册的周期性活动
    pub fn scheduled_activities(&self) -> Vec<ScheduledActivity> {
        self.scheduler.activities()
    }

    /// 运行参数
    pub const fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 关闭上下文
    ///
    /// 先停止调度器，再对已就绪的组件调用销毁前钩子，最后丢弃所有组件和配置。
    /// 重复调用不会产生任何效果。
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("关闭应用上下文");
        self.scheduler.stop().await;
        self.teardown();
    }

    fn teardown(&self) {
        let failures = self.registry.destroy_all();
        if failures > 0 {
            warn!("{} 个销毁前钩子调用失败", failures);
        }
        self.registry.clear();
        self.config.clear();
        info!("应用上下文已关闭");
    }
}

impl Drop for ApplicationContext {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.scheduler.stop_now();
            self.teardown();
        }
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("components", &self.registry.len())
            .field("config_entries", &self.config.len())
            .field("scheduler", &self.scheduler)
            .field("closed", &self.is_closed())
            .finish()
    }
}
