//! 依赖注入器
//!
//! 选择构造函数、解析参数、构建实例并完成字段注入

use config_abstractions::ConfigResolver;
use di_abstractions::{ComponentRegistry, ResolveContext};
use infrastructure_common::{
    Argument, Arguments, BoxedInstance, ComponentDefinition, ConstructorDefinition, DependencyError,
    Requirement,
};
use tracing::debug;

/// 选择构造函数
///
/// 恰好一个注入构造函数时使用它，否则使用无参构造函数。
pub fn select_constructor(definition: &ComponentDefinition) -> Result<&ConstructorDefinition, DependencyError> {
    let mut injectable = definition.constructors().iter().filter(|c| c.is_injectable());
    if let (Some(only), None) = (injectable.next(), injectable.next()) {
        return Ok(only);
    }

    definition
        .constructors()
        .iter()
        .find(|c| !c.is_injectable())
        .ok_or_else(|| DependencyError::NoSuitableConstructor {
            type_name: definition.type_info().name.to_string(),
        })
}

/// 依赖注入器
pub struct Injector<'a> {
    registry: &'a dyn ComponentRegistry,
    config: &'a dyn ConfigResolver,
}

impl<'a> Injector<'a> {
    /// 创建新的注入器
    pub fn new(registry: &'a dyn ComponentRegistry, config: &'a dyn ConfigResolver) -> Self {
        Self { registry, config }
    }

    /// 解析单个需求
    pub fn resolve_argument(
        &self,
        requirement: &Requirement,
        context: &mut ResolveContext,
    ) -> Result<Argument, DependencyError> {
        match requirement {
            Requirement::Component(type_info) => {
                debug!("解析组件依赖: {}", type_info);
                Ok(Argument::Component(self.registry.resolve(*type_info, context)?))
            }
            Requirement::Value { key, value_type } => {
                debug!("解析配置依赖: {} ({})", key, value_type);
                Ok(Argument::Value {
                    key: key.clone(),
                    value: self.config.resolve_erased(*value_type, key)?,
                })
            }
        }
    }

    /// 按顺序解析参数列表
    pub fn resolve_arguments(
        &self,
        requirements: &[Requirement],
        context: &mut ResolveContext,
    ) -> Result<Arguments, DependencyError> {
        let values = requirements
            .iter()
            .map(|requirement| self.resolve_argument(requirement, context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arguments::new(values))
    }

    /// 构建实例并完成字段注入
    pub fn instantiate(
        &self,
        definition: &ComponentDefinition,
        context: &mut ResolveContext,
    ) -> Result<BoxedInstance, DependencyError> {
        let type_info = definition.type_info();
        let constructor = select_constructor(definition)?;
        let mut arguments = self.resolve_arguments(constructor.requirements(), context)?;

        debug!("构造组件: {} ({} 个参数)", type_info, constructor.requirements().len());
        let mut instance = constructor
            .construct(&mut arguments)
            .map_err(|source| match source.downcast::<DependencyError>() {
                // 构造函数读取参数时产生的注入错误原样返回
                Ok(error) => *error,
                Err(source) => DependencyError::ComponentCreationFailed {
                    type_name: type_info.name.to_string(),
                    source,
                },
            })?;

        self.inject_fields(definition, &mut instance, context)?;
        Ok(instance)
    }

    /// 注入字段
    pub fn inject_fields(
        &self,
        definition: &ComponentDefinition,
        instance: &mut BoxedInstance,
        context: &mut ResolveContext,
    ) -> Result<(), DependencyError> {
        for field in definition.field_injections() {
            debug!("注入字段: {}.{}", definition.type_info(), field.name());
            let argument = self.resolve_argument(field.requirement(), context)?;
            field.apply(instance.as_mut(), argument)?;
        }
        Ok(())
    }
}
