//! 组件发现抽象接口
//!
//! 根据扫描根路径产生候选组件定义

use async_trait::async_trait;
use infrastructure_common::{ComponentDefinition, ComponentError};

/// 组件发现器 trait
#[async_trait]
pub trait ComponentDiscovery: Send + Sync {
    /// 发现组件
    async fn discover(&self, criteria: &DiscoveryCriteria) -> Result<Vec<ComponentDefinition>, ComponentError>;

    /// 获取发现器名称
    fn name(&self) -> &str;
}

/// 发现条件
#[derive(Debug, Clone, Default)]
pub struct DiscoveryCriteria {
    /// 扫描根（模块路径前缀），空字符串表示全部
    pub scan_root: String,
    /// 排除的模块路径前缀
    pub exclude_prefixes: Vec<String>,
}

impl DiscoveryCriteria {
    /// 创建新的发现条件
    pub fn new(scan_root: impl Into<String>) -> Self {
        Self {
            scan_root: scan_root.into(),
            exclude_prefixes: Vec::new(),
        }
    }

    /// 添加排除前缀
    pub fn exclude<S: Into<String>>(mut self, prefix: S) -> Self {
        self.exclude_prefixes.push(prefix.into());
        self
    }

    /// 模块路径是否在扫描范围内
    pub fn matches(&self, module_path: &str) -> bool {
        is_within(module_path, &self.scan_root)
            && !self
                .exclude_prefixes
                .iter()
                .any(|prefix| !prefix.is_empty() && is_within(module_path, prefix))
    }
}

/// 按 `::` 边界判断模块路径是否位于前缀之下
fn is_within(module_path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match module_path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}
