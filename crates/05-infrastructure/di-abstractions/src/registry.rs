//! 组件注册表抽象接口

use crate::resolver::ResolveContext;
use infrastructure_common::{DependencyError, ErasedInstance, LifecycleState, TypeInfo};
use std::any::TypeId;
use std::sync::Arc;

/// 组件注册表 trait
///
/// 每个已注册类型至多一个实例，首次解析时构建
pub trait ComponentRegistry: Send + Sync {
    /// 在给定解析上下文中解析组件
    fn resolve(&self, type_info: TypeInfo, context: &mut ResolveContext) -> Result<ErasedInstance, DependencyError>;

    /// 检查组件是否已注册（通过 TypeId）
    fn is_registered_by_type_id(&self, type_id: TypeId) -> bool;

    /// 组件生命周期状态，未注册时返回 `None`
    fn state(&self, type_id: TypeId) -> Option<LifecycleState>;

    /// 所有已注册组件的类型信息，按注册顺序
    fn registered_types(&self) -> Vec<TypeInfo>;
}

/// 类型化访问扩展
pub trait ComponentRegistryExt: ComponentRegistry {
    /// 解析组件，未注册时返回 `ComponentNotRegistered`
    fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DependencyError> {
        let type_info = TypeInfo::of::<T>();
        let instance = self.resolve(type_info, &mut ResolveContext::new())?;
        instance
            .downcast::<T>()
            .map_err(|_| DependencyError::ArgumentMismatch {
                expected: type_info.name.to_string(),
                actual: "注册表中的其他实例类型".to_string(),
            })
    }

    /// 解析组件，未注册时返回 `Ok(None)`；构建失败仍然返回错误
    fn find<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, DependencyError> {
        if !self.is_registered::<T>() {
            return Ok(None);
        }
        self.get::<T>().map(Some)
    }

    /// 检查组件是否已注册
    fn is_registered<T: 'static>(&self) -> bool {
        self.is_registered_by_type_id(TypeId::of::<T>())
    }
}

impl<R: ComponentRegistry + ?Sized> ComponentRegistryExt for R {}
