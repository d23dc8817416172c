//! 错误类型定义

use thiserror::Error;

/// 生命周期钩子、构造函数与定时方法返回的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {path}, 原因: {source}")]
    FileReadError {
        path: String,
        source: std::io::Error,
    },

    #[error("配置解析失败: {path}, 原因: {source}")]
    ParseError { path: String, source: BoxError },

    #[error("不支持的配置文件扩展名: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置值无效: 无法将 {value} 解析为 {type_name}, 原因: {reason}")]
    InvalidValue {
        type_name: String,
        value: String,
        reason: String,
    },

    #[error("枚举 {type_name} 中不存在值 {value}")]
    UnknownEnumValue { type_name: String, value: String },

    #[error("不支持的配置值类型: {type_name}")]
    UnsupportedConfigType { type_name: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },
}

impl ConfigError {
    /// 是否属于配置加载阶段的错误
    pub const fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::FileReadError { .. } | Self::ParseError { .. } | Self::UnsupportedFormat { .. }
        )
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    #[error("组件重复注册: {type_name}")]
    DuplicateComponent { type_name: String },

    #[error("组件 {type_name} 没有可用的构造函数: 需要唯一的注入构造函数或无参构造函数")]
    NoSuitableConstructor { type_name: String },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed { type_name: String, source: BoxError },

    #[error("生命周期方法 {hook} 在 {declared_on} 上调用失败: {source}")]
    LifecycleInvocationFailed {
        hook: String,
        declared_on: String,
        source: BoxError,
    },

    #[error("参数不匹配: 期望 {expected}, 实际 {actual}")]
    ArgumentMismatch { expected: String, actual: String },

    #[error("配置注入失败: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

/// 组件发现错误类型
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("组件发现失败: {message}")]
    DiscoveryError { message: String },
}

impl ComponentError {
    /// 创建发现错误
    pub fn discovery_error(message: impl Into<String>) -> Self {
        Self::DiscoveryError {
            message: message.into(),
        }
    }
}

/// 任务调度错误类型
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("定时方法 {method} (组件 {type_name}) 的 fixed_delay 必须 > 0, 实际: {fixed_delay}")]
    InvalidSchedule {
        type_name: String,
        method: String,
        fixed_delay: i64,
    },

    #[error("调度器状态无效: 期望 {expected}, 实际 {actual}")]
    InvalidState { expected: String, actual: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("组件错误: {source}")]
    ComponentError {
        #[from]
        source: ComponentError,
    },

    #[error("调度错误: {source}")]
    SchedulerError {
        #[from]
        source: SchedulerError,
    },
}
