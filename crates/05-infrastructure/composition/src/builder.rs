//! 应用上下文构建器

use crate::context::{ApplicationContext, ContextOptions};
use config_abstractions::ConfigResolver;
use config_impl::{ConfigLoaderFactory, ConfigStore};
use di_abstractions::{ComponentDiscovery, DiscoveryCriteria};
use di_impl::{ComponentRegistryImpl, GlobalComponentDiscovery};
use infrastructure_common::{
    coerce_enum, Component, ComponentDefinition, ConfigCoercer, ConfigEnum, ConfigValue, FlatConfig,
    InfrastructureError,
};
use std::any::TypeId;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 应用上下文构建器
///
/// 使用建造者模式组装配置来源、组件发现器和显式注册的组件定义。
/// 调用 [`scan`](Self::scan) 时使用全局组件发现器按模块路径扫描 `#[derive(Component)]` 组件。
pub struct ApplicationContextBuilder {
    /// 扫描根
    scan_root: Option<String>,
    /// 配置文件
    config_path: Option<PathBuf>,
    /// 程序化配置值，优先于文件中的同名键
    overrides: FlatConfig,
    /// 显式注册的组件定义
    definitions: Vec<ComponentDefinition>,
    /// 额外的组件发现器
    discoveries: Vec<Box<dyn ComponentDiscovery>>,
    /// 额外的枚举转换函数
    enum_coercers: Vec<(TypeId, ConfigCoercer)>,
    options: ContextOptions,
}

impl ApplicationContextBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            scan_root: None,
            config_path: None,
            overrides: FlatConfig::new(),
            definitions: Vec::new(),
            discoveries: Vec::new(),
            enum_coercers: Vec::new(),
            options: ContextOptions::default(),
        }
    }

    /// 扫描指定模块路径下的组件，空字符串表示扫描全部
    pub fn scan(mut self, root: impl Into<String>) -> Self {
        self.scan_root = Some(root.into());
        self
    }

    /// 设置配置文件，格式由扩展名决定
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// 设置配置值，覆盖配置文件中的同名键
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// 注册组件定义
    pub fn register(mut self, definition: ComponentDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// 注册实现了 [`Component`] 的组件
    pub fn register_component<T: Component>(self) -> Self {
        self.register(T::definition())
    }

    /// 添加组件发现器
    pub fn with_discovery(mut self, discovery: Box<dyn ComponentDiscovery>) -> Self {
        self.discoveries.push(discovery);
        self
    }

    /// 注册可注入的枚举
    pub fn register_enum<E: ConfigEnum>(mut self) -> Self {
        self.enum_coercers.push((TypeId::of::<E>(), coerce_enum::<E>));
        self
    }

    /// 定时任务工作池大小
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.options.pool_size = pool_size.max(1);
        self
    }

    /// 关闭时等待定时任务结束的时间
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.options.shutdown_grace = grace;
        self
    }

    /// 构建并启动应用上下文
    ///
    /// 配置加载失败、组件发现失败、重复注册、调度参数非法或立即初始化的组件构建失败
    /// 都会使启动失败，不会留下部分可用的上下文。
    pub async fn build(self) -> Result<ApplicationContext, InfrastructureError> {
        info!("开始构建应用上下文");

        let mut values = match &self.config_path {
            Some(path) => ConfigLoaderFactory::new().load_file(path).await?,
            None => FlatConfig::new(),
        };
        for (key, value) in self.overrides {
            debug!("程序化配置覆盖: {}", key);
            values.insert(key, value);
        }

        let mut store = ConfigStore::new(values);
        for (type_id, coercer) in self.enum_coercers {
            store.insert_coercer(type_id, coercer);
        }
        let config = Arc::new(store);
        let resolver: Arc<dyn ConfigResolver> = Arc::clone(&config) as Arc<dyn ConfigResolver>;
        let registry = Arc::new(ComponentRegistryImpl::new(resolver));

        let mut discoveries = self.discoveries;
        let criteria = match self.scan_root {
            Some(root) => {
                discoveries.insert(0, Box::new(GlobalComponentDiscovery::new()));
                DiscoveryCriteria::new(root)
            }
            None => DiscoveryCriteria::default(),
        };

        for discovery in &discoveries {
            debug!("执行组件发现: {}", discovery.name());
            for definition in discovery.discover(&criteria).await? {
                registry.register(definition)?;
            }
        }
        for definition in self.definitions {
            registry.register(definition)?;
        }

        ApplicationContext::start(config, registry, self.options)
    }
}

impl Default for ApplicationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApplicationContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContextBuilder")
            .field("scan_root", &self.scan_root)
            .field("config_path", &self.config_path)
            .field("definitions", &self.definitions.len())
            .field("discoveries", &self.discoveries.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
