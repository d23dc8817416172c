//! 组件发现实现

use async_trait::async_trait;
use di_abstractions::{ComponentDiscovery, DiscoveryCriteria};
use infrastructure_common::{component_registrations, ComponentDefinition, ComponentError};
use tracing::{debug, info};

/// 全局组件发现器
///
/// 从 `#[derive(Component)]` 在进程启动时登记的全局表中按模块路径筛选组件。
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalComponentDiscovery;

impl GlobalComponentDiscovery {
    /// 创建新的全局组件发现器
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ComponentDiscovery for GlobalComponentDiscovery {
    async fn discover(&self, criteria: &DiscoveryCriteria) -> Result<Vec<ComponentDefinition>, ComponentError> {
        let mut registrations: Vec<_> = component_registrations()
            .into_iter()
            .filter(|registration| criteria.matches(registration.module_path))
            .collect();
        // 进程启动时的登记顺序不确定，按路径排序保证发现顺序稳定
        registrations.sort_by(|a, b| {
            (a.module_path, a.type_name).cmp(&(b.module_path, b.type_name))
        });

        let mut definitions = Vec::with_capacity(registrations.len());
        for registration in &registrations {
            debug!("发现组件: {} ({})", registration.type_name, registration.module_path);
            let definition = (registration.definition)();
            // 登记项声明的类型必须与定义工厂产出的类型一致
            if definition.type_info().name != registration.type_name {
                return Err(ComponentError::discovery_error(format!(
                    "登记项 {} ({}) 的定义类型为 {}",
                    registration.type_name,
                    registration.module_path,
                    definition.type_info().name
                )));
            }
            definitions.push(definition);
        }

        info!("扫描 '{}' 发现 {} 个组件", criteria.scan_root, definitions.len());
        Ok(definitions)
    }

    fn name(&self) -> &str {
        "GlobalComponentDiscovery"
    }
}

/// 静态组件发现器
///
/// 返回预先给定的组件定义，忽略扫描根。
#[derive(Debug, Default, Clone)]
pub struct StaticComponentDiscovery {
    definitions: Vec<ComponentDefinition>,
}

impl StaticComponentDiscovery {
    /// 创建新的静态组件发现器
    pub fn new(definitions: Vec<ComponentDefinition>) -> Self {
        Self { definitions }
    }

    /// 添加组件定义
    pub fn with_definition(mut self, definition: ComponentDefinition) -> Self {
        self.definitions.push(definition);
        self
    }
}

#[async_trait]
impl ComponentDiscovery for StaticComponentDiscovery {
    async fn discover(&self, _criteria: &DiscoveryCriteria) -> Result<Vec<ComponentDefinition>, ComponentError> {
        Ok(self.definitions.clone())
    }

    fn name(&self) -> &str {
        "StaticComponentDiscovery"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::{register_component, Component, RegisteredComponent};

    mod scanned {
        use super::*;

        #[derive(Default)]
        pub struct Inside;

        impl Component for Inside {
            fn definition() -> ComponentDefinition {
                ComponentDefinition::builder::<Self>().default_constructor().build()
            }
        }
    }

    mod elsewhere {
        use super::*;

        #[derive(Default)]
        pub struct Outside;

        impl Component for Outside {
            fn definition() -> ComponentDefinition {
                ComponentDefinition::builder::<Self>().default_constructor().build()
            }
        }
    }

    #[tokio::test]
    async fn test_global_discovery_filters_by_scan_root() {
        register_component(RegisteredComponent::of::<scanned::Inside>(
            "di_impl::discovery::tests::scanned",
        ));
        register_component(RegisteredComponent::of::<elsewhere::Outside>(
            "di_impl::discovery::tests::elsewhere",
        ));

        let found = GlobalComponentDiscovery::new()
            .discover(&DiscoveryCriteria::new("di_impl::discovery::tests::scanned"))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].type_info().is::<scanned::Inside>());
    }

    #[tokio::test]
    async fn test_global_discovery_rejects_mismatched_registration() {
        register_component(RegisteredComponent {
            module_path: "di_impl::discovery::tests::mismatched",
            type_name: "di_impl::discovery::tests::mismatched::Ghost",
            definition: scanned::Inside::definition,
        });

        let err = GlobalComponentDiscovery::new()
            .discover(&DiscoveryCriteria::new("di_impl::discovery::tests::mismatched"))
            .await
            .unwrap_err();

        match err {
            ComponentError::DiscoveryError { message } => assert!(message.contains("Ghost")),
        }
    }

    #[tokio::test]
    async fn test_static_discovery() {
        let discovery = StaticComponentDiscovery::default()
            .with_definition(scanned::Inside::definition());
        let found = discovery.discover(&DiscoveryCriteria::new("ignored")).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
