//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn 组件运行时的公共类型。
//!
//! ## 核心组件
//!
//! - [`ComponentDefinition`] - 组件定义（构造函数、注入、钩子、定时方法）
//! - [`Component`] - 提供组件定义的 trait
//! - [`ConfigValue`] / [`ConfigEnum`] - 未类型化配置值与可注入枚举
//! - [`Schedule`] - 定时方法的调度参数
//! - [`LifecycleState`] - 组件生命周期状态
//!
//! 过程宏生成的代码在进程启动时把组件定义和枚举转换函数登记到本 crate 的全局表中，
//! 组件发现再按模块路径从表中取出。

pub mod component;
pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;
pub mod scheduling;

pub use component::*;
pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
pub use scheduling::*;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;

/// 登记到全局表中的组件
#[derive(Debug, Clone, Copy)]
pub struct RegisteredComponent {
    /// 声明组件的模块路径
    pub module_path: &'static str,
    /// 组件类型名称
    pub type_name: &'static str,
    /// 组件定义工厂
    pub definition: fn() -> ComponentDefinition,
}

impl RegisteredComponent {
    /// 为实现了 [`Component`] 的类型创建登记项
    pub fn of<T: Component>(module_path: &'static str) -> Self {
        Self {
            module_path,
            type_name: std::any::type_name::<T>(),
            definition: T::definition,
        }
    }
}

/// 全局组件登记表
static COMPONENT_REGISTRATIONS: Lazy<RwLock<Vec<RegisteredComponent>>> =
    Lazy::new(|| RwLock::new(Vec::new()));

/// 全局配置枚举转换表
static CONFIG_ENUM_COERCERS: Lazy<RwLock<HashMap<TypeId, ConfigCoercer>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// 登记组件
pub fn register_component(registration: RegisteredComponent) {
    COMPONENT_REGISTRATIONS.write().push(registration);
}

/// 获取所有已登记的组件，按登记顺序
pub fn component_registrations() -> Vec<RegisteredComponent> {
    COMPONENT_REGISTRATIONS.read().clone()
}

/// 登记可注入的配置枚举
pub fn register_config_enum<E: ConfigEnum>() {
    CONFIG_ENUM_COERCERS
        .write()
        .insert(TypeId::of::<E>(), coerce_enum::<E>);
}

/// 查找已登记枚举的转换函数
pub fn config_enum_coercer(type_id: TypeId) -> Option<ConfigCoercer> {
    CONFIG_ENUM_COERCERS.read().get(&type_id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl ConfigEnum for Level {
        fn constants() -> &'static [Self] {
            const CONSTANTS: &[Level] = &[Level::Low, Level::High];
            CONSTANTS
        }

        fn constant_name(&self) -> &'static str {
            match self {
                Self::Low => "LOW",
                Self::High => "HIGH",
            }
        }
    }

    #[derive(Default)]
    struct Registered;

    impl Component for Registered {
        fn definition() -> ComponentDefinition {
            ComponentDefinition::builder::<Self>().default_constructor().build()
        }
    }

    #[test]
    fn test_register_config_enum() {
        register_config_enum::<Level>();
        let coercer = config_enum_coercer(TypeId::of::<Level>()).unwrap();
        let value = coercer(&ConfigValue::from("HIGH")).unwrap();
        assert_eq!(*value.downcast::<Level>().unwrap(), Level::High);
    }

    #[test]
    fn test_register_component() {
        register_component(RegisteredComponent::of::<Registered>(module_path!()));
        let found = component_registrations()
            .into_iter()
            .find(|r| r.type_name.ends_with("::Registered"))
            .unwrap();
        assert_eq!(found.module_path, module_path!());
        assert!((found.definition)().type_info().is::<Registered>());
    }
}
