//! 配置加载抽象接口

use async_trait::async_trait;
use infrastructure_common::{ConfigError, FlatConfig};
use std::fmt;
use std::path::Path;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    /// Java 风格的 `.properties`
    Properties,
    /// JSON
    Json,
    /// YAML（`.yaml` / `.yml`）
    Yaml,
    /// TOML
    Toml,
}

impl ConfigFormat {
    /// 根据扩展名选择格式，大小写不敏感
    pub fn from_extension(extension: &str) -> Result<Self, ConfigError> {
        match extension.to_ascii_lowercase().as_str() {
            "properties" => Ok(Self::Properties),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    /// 根据文件路径选择格式
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }

    /// 格式名称
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 配置加载器 trait
///
/// 从单个配置源读取并产生扁平化的键值映射，嵌套结构以 `.` 连接。
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 加载配置
    async fn load(&self, path: &Path) -> Result<FlatConfig, ConfigError>;

    /// 加载器处理的格式
    fn format(&self) -> ConfigFormat;

    /// 加载器名称
    fn name(&self) -> &str;
}
