//! 组件注册表实现

use crate::injector::Injector;
use crate::lifecycle::LifecycleManager;
use config_abstractions::ConfigResolver;
use dashmap::DashMap;
use di_abstractions::{ComponentRegistry, ResolveContext};
use infrastructure_common::{
    ComponentDefinition, DependencyError, ErasedInstance, LifecycleState, TypeInfo,
};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, info};

/// 组件描述符
///
/// 持有组件定义和至多一个实例。实例只会被设置一次。
pub struct ComponentDescriptor {
    definition: ComponentDefinition,
    instance: OnceCell<ErasedInstance>,
}

impl ComponentDescriptor {
    fn new(definition: ComponentDefinition) -> Self {
        Self {
            definition,
            instance: OnceCell::new(),
        }
    }

    /// 组件类型
    pub fn type_info(&self) -> TypeInfo {
        self.definition.type_info()
    }

    /// 组件定义
    pub const fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }

    /// 生命周期状态
    pub fn state(&self) -> LifecycleState {
        if self.instance.get().is_some() {
            LifecycleState::Ready
        } else {
            LifecycleState::Uninitialized
        }
    }

    /// 已构建的实例
    pub fn instance(&self) -> Option<ErasedInstance> {
        self.instance.get().cloned()
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("type", &self.type_info().name)
            .field("lazy", &self.definition.is_lazy())
            .field("state", &self.state())
            .finish()
    }
}

/// 组件注册表实现
///
/// 首次解析时在调用线程上同步构建组件；每个类型的构建由 `OnceCell` 保证至多成功一次，
/// 失败后组件保持未初始化，下次解析会重试。
///
/// 循环依赖只在同一条解析链内检测。两个线程同时首次解析互相依赖的 A 与 B
/// （一个从 A 出发，一个从 B 出发）时，各自持有对方等待的 `OnceCell`，
/// 两个线程都会阻塞而不是返回 `CircularDependency`。存在这类依赖时应在启动阶段
/// 以非延迟组件构建，由单线程的启动流程先报告循环。
pub struct ComponentRegistryImpl {
    descriptors: DashMap<TypeId, Arc<ComponentDescriptor>>,
    order: RwLock<Vec<TypeId>>,
    config: Arc<dyn ConfigResolver>,
    lifecycle: LifecycleManager,
}

impl ComponentRegistryImpl {
    /// 创建新的注册表
    pub fn new(config: Arc<dyn ConfigResolver>) -> Self {
        Self {
            descriptors: DashMap::new(),
            order: RwLock::new(Vec::new()),
            config,
            lifecycle: LifecycleManager::new(),
        }
    }

    /// 注册组件定义，同一类型只能注册一次
    pub fn register(&self, definition: ComponentDefinition) -> Result<(), DependencyError> {
        let type_info = definition.type_info();
        match self.descriptors.entry(type_info.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(DependencyError::DuplicateComponent {
                    type_name: type_info.name.to_string(),
                });
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Arc::new(ComponentDescriptor::new(definition)));
            }
        }
        self.order.write().push(type_info.id);
        info!("注册组件: {}", type_info.name);
        Ok(())
    }

    /// 获取描述符
    pub fn descriptor(&self, type_id: TypeId) -> Option<Arc<ComponentDescriptor>> {
        self.descriptors.get(&type_id).map(|entry| Arc::clone(entry.value()))
    }

    /// 所有描述符，按注册顺序
    pub fn descriptors(&self) -> Vec<Arc<ComponentDescriptor>> {
        self.order
            .read()
            .iter()
            .filter_map(|type_id| self.descriptor(*type_id))
            .collect()
    }

    /// 已就绪的组件，按注册顺序
    pub fn ready_components(&self) -> Vec<Arc<ComponentDescriptor>> {
        self.descriptors()
            .into_iter()
            .filter(|descriptor| descriptor.state() == LifecycleState::Ready)
            .collect()
    }

    /// 已注册组件数量
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// 是否没有注册任何组件
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// 配置解析器
    pub fn config(&self) -> &Arc<dyn ConfigResolver> {
        &self.config
    }

    /// 对所有已就绪组件调用销毁前钩子，返回失败的钩子数量
    ///
    /// 从未构建的组件不会收到任何调用。
    pub fn destroy_all(&self) -> usize {
        let injector = Injector::new(self, self.config.as_ref());
        let mut failures = 0;
        for descriptor in self.ready_components() {
            if let Some(instance) = descriptor.instance() {
                debug!("销毁组件: {}", descriptor.type_info());
                failures += self
                    .lifecycle
                    .pre_destroy(descriptor.definition(), &*instance, &injector);
            }
        }
        failures
    }

    /// 清理所有注册信息和实例
    pub fn clear(&self) {
        self.order.write().clear();
        self.descriptors.clear();
    }

    /// 构建组件：实例化、字段注入、构造后钩子
    fn create(
        &self,
        descriptor: &ComponentDescriptor,
        context: &mut ResolveContext,
    ) -> Result<ErasedInstance, DependencyError> {
        let definition = descriptor.definition();
        debug!("创建组件: {}", definition.type_info());

        let injector = Injector::new(self, self.config.as_ref());
        let mut instance = injector.instantiate(definition, context)?;
        self.lifecycle
            .post_construct(definition, &mut *instance, &injector, context)?;

        info!("组件已就绪: {}", definition.type_info().name);
        Ok(Arc::from(instance))
    }
}

impl ComponentRegistry for ComponentRegistryImpl {
    fn resolve(&self, type_info: TypeInfo, context: &mut ResolveContext) -> Result<ErasedInstance, DependencyError> {
        let descriptor = self
            .descriptor(type_info.id)
            .ok_or_else(|| DependencyError::ComponentNotRegistered {
                type_name: type_info.name.to_string(),
            })?;

        if let Some(instance) = descriptor.instance() {
            return Ok(instance);
        }

        // 在触碰 OnceCell 之前检测环路，避免同一线程重入初始化
        context.push_type(type_info)?;
        let result = descriptor
            .instance
            .get_or_try_init(|| self.create(&descriptor, context))
            .cloned();
        context.pop_type();
        result
    }

    fn is_registered_by_type_id(&self, type_id: TypeId) -> bool {
        self.descriptors.contains_key(&type_id)
    }

    fn state(&self, type_id: TypeId) -> Option<LifecycleState> {
        self.descriptor(type_id).map(|descriptor| descriptor.state())
    }

    fn registered_types(&self) -> Vec<TypeInfo> {
        self.descriptors()
            .iter()
            .map(|descriptor| descriptor.type_info())
            .collect()
    }
}

impl std::fmt::Debug for ComponentRegistryImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistryImpl")
            .field("components", &self.descriptors())
            .finish_non_exhaustive()
    }
}
