//! 配置加载器工厂

use crate::providers::{JsonConfigLoader, PropertiesConfigLoader, TomlConfigLoader, YamlConfigLoader};
use config_abstractions::{ConfigFormat, ConfigLoader};
use infrastructure_common::{ConfigError, FlatConfig};
use std::path::Path;
use tracing::info;

/// 配置加载器工厂
///
/// 按文件扩展名选择加载器。
#[derive(Debug, Default)]
pub struct ConfigLoaderFactory;

impl ConfigLoaderFactory {
    /// 创建新的工厂
    pub fn new() -> Self {
        Self
    }

    /// 获取指定格式的加载器
    pub fn loader_for(&self, format: ConfigFormat) -> Box<dyn ConfigLoader> {
        match format {
            ConfigFormat::Properties => Box::new(PropertiesConfigLoader::new()),
            ConfigFormat::Json => Box::new(JsonConfigLoader::new()),
            ConfigFormat::Yaml => Box::new(YamlConfigLoader::new()),
            ConfigFormat::Toml => Box::new(TomlConfigLoader::new()),
        }
    }

    /// 按扩展名加载配置文件
    pub async fn load_file(&self, path: &Path) -> Result<FlatConfig, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let loader = self.loader_for(format);
        let values = loader.load(path).await?;
        info!(
            "配置文件加载完成: {} ({}, {} 项)",
            path.display(),
            loader.name(),
            values.len()
        );
        Ok(values)
    }
}
