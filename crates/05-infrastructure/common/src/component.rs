//! 组件定义
//!
//! 每个组件类型通过 [`ComponentDefinition`] 描述自身：构造函数及其依赖、
//! 字段注入、生命周期钩子和定时方法。定义可以手写，也可以由
//! `#[derive(Component)]` 在编译期生成。

use crate::errors::{BoxError, ConfigError, DependencyError};
use crate::lifecycle::HookSignature;
use crate::metadata::TypeInfo;
use crate::scheduling::Schedule;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 已构建的组件实例（擦除类型）
pub type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// 构造中的组件实例（擦除类型）
pub type BoxedInstance = Box<dyn Any + Send + Sync>;

type ConstructFn = Arc<dyn Fn(&mut Arguments) -> Result<BoxedInstance, BoxError> + Send + Sync>;
type FieldFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync), Argument) -> Result<(), DependencyError> + Send + Sync>;
type PostConstructFn =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync), &mut Arguments) -> Result<(), BoxError> + Send + Sync>;
type PreDestroyFn = Arc<dyn Fn(&(dyn Any + Send + Sync), &mut Arguments) -> Result<(), BoxError> + Send + Sync>;
type PeriodicFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync>;

/// 组件 trait
///
/// 实现者提供自身的组件定义，通常由 `#[derive(Component)]` 生成。
pub trait Component: Sized + Send + Sync + 'static {
    /// 组件定义
    fn definition() -> ComponentDefinition;
}

/// 注入需求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// 按类型解析另一个组件
    Component(TypeInfo),
    /// 按键读取配置值并转换为指定类型
    Value { key: String, value_type: TypeInfo },
}

impl Requirement {
    /// 组件依赖
    pub fn component<T: Send + Sync + 'static>() -> Self {
        Self::Component(TypeInfo::of::<T>())
    }

    /// 配置值依赖
    pub fn value<V: Send + Sync + 'static>(key: impl Into<String>) -> Self {
        Self::Value {
            key: key.into(),
            value_type: TypeInfo::of::<V>(),
        }
    }

    /// 参数类型
    pub const fn type_info(&self) -> TypeInfo {
        match self {
            Self::Component(type_info) => *type_info,
            Self::Value { value_type, .. } => *value_type,
        }
    }
}

/// 已解析的单个参数
pub enum Argument {
    /// 组件实例
    Component(ErasedInstance),
    /// 配置值，键不存在时为 `None`
    Value {
        key: String,
        value: Option<BoxedInstance>,
    },
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component(_) => f.write_str("Argument::Component"),
            Self::Value { key, value } => f
                .debug_struct("Argument::Value")
                .field("key", key)
                .field("present", &value.is_some())
                .finish(),
        }
    }
}

impl Argument {
    fn kind(&self) -> &'static str {
        match self {
            Self::Component(_) => "component",
            Self::Value { .. } => "config value",
        }
    }

    /// 取出组件实例
    pub fn into_component<T: Send + Sync + 'static>(self) -> Result<Arc<T>, DependencyError> {
        match self {
            Self::Component(instance) => instance.downcast::<T>().map_err(|_| mismatch::<T>("另一组件类型")),
            other => Err(mismatch::<T>(other.kind())),
        }
    }

    /// 取出配置值
    pub fn into_value<V: Send + Sync + 'static>(self) -> Result<Option<V>, DependencyError> {
        match self {
            Self::Value { value: None, .. } => Ok(None),
            Self::Value { value: Some(value), .. } => value
                .downcast::<V>()
                .map(|value| Some(*value))
                .map_err(|_| mismatch::<V>("另一配置值类型")),
            other => Err(mismatch::<V>(other.kind())),
        }
    }
}

fn mismatch<T: ?Sized>(actual: &str) -> DependencyError {
    DependencyError::ArgumentMismatch {
        expected: std::any::type_name::<T>().to_string(),
        actual: actual.to_string(),
    }
}

/// 按需求顺序解析好的参数列表，按位置依次取出
#[derive(Debug, Default)]
pub struct Arguments {
    values: VecDeque<Argument>,
}

impl Arguments {
    /// 创建参数列表
    pub fn new(values: Vec<Argument>) -> Self {
        Self {
            values: values.into(),
        }
    }

    fn next(&mut self) -> Result<Argument, DependencyError> {
        self.values.pop_front().ok_or_else(|| DependencyError::ArgumentMismatch {
            expected: "更多参数".to_string(),
            actual: "参数已耗尽".to_string(),
        })
    }

    /// 取出下一个组件参数
    pub fn component<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>, DependencyError> {
        self.next()?.into_component::<T>()
    }

    /// 取出下一个配置值参数，键不存在时为 `None`
    pub fn value<V: Send + Sync + 'static>(&mut self) -> Result<Option<V>, DependencyError> {
        self.next()?.into_value::<V>()
    }

    /// 取出下一个必需的配置值参数
    pub fn required_value<V: Send + Sync + 'static>(&mut self) -> Result<V, DependencyError> {
        match self.next()? {
            Argument::Value { key, value: None } => Err(ConfigError::KeyNotFound { key }.into()),
            argument => argument
                .into_value::<V>()?
                .ok_or_else(|| mismatch::<V>("空值")),
        }
    }

    /// 剩余参数数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有剩余参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 构造函数定义
#[derive(Clone)]
pub struct ConstructorDefinition {
    requirements: Vec<Requirement>,
    injectable: bool,
    construct: ConstructFn,
}

impl ConstructorDefinition {
    /// 参数需求
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// 是否为注入构造函数（否则为无参构造函数）
    pub const fn is_injectable(&self) -> bool {
        self.injectable
    }

    /// 使用解析好的参数构造实例
    pub fn construct(&self, arguments: &mut Arguments) -> Result<BoxedInstance, BoxError> {
        (self.construct)(arguments)
    }
}

impl fmt::Debug for ConstructorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDefinition")
            .field("requirements", &self.requirements)
            .field("injectable", &self.injectable)
            .finish_non_exhaustive()
    }
}

/// 字段注入定义
#[derive(Clone)]
pub struct FieldInjection {
    name: &'static str,
    requirement: Requirement,
    apply: FieldFn,
}

impl FieldInjection {
    /// 字段名称
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// 字段需求
    pub const fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// 将解析好的参数写入实例字段
    pub fn apply(&self, target: &mut (dyn Any + Send + Sync), argument: Argument) -> Result<(), DependencyError> {
        (self.apply)(target, argument)
    }
}

impl fmt::Debug for FieldInjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInjection")
            .field("name", &self.name)
            .field("requirement", &self.requirement)
            .finish_non_exhaustive()
    }
}

/// 生命周期钩子定义
#[derive(Clone)]
pub struct HookDefinition<F> {
    name: String,
    requirements: Vec<Requirement>,
    invoke: F,
}

impl<F> HookDefinition<F> {
    /// 方法名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 参数需求
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// 钩子签名
    pub fn signature(&self) -> HookSignature {
        HookSignature::new(
            self.name.clone(),
            self.requirements.iter().map(|r| r.type_info().name).collect(),
        )
    }
}

impl HookDefinition<PostConstructFn> {
    /// 调用构造后钩子
    pub fn invoke(&self, target: &mut (dyn Any + Send + Sync), arguments: &mut Arguments) -> Result<(), BoxError> {
        (self.invoke)(target, arguments)
    }
}

impl HookDefinition<PreDestroyFn> {
    /// 调用销毁前钩子
    pub fn invoke(&self, target: &(dyn Any + Send + Sync), arguments: &mut Arguments) -> Result<(), BoxError> {
        (self.invoke)(target, arguments)
    }
}

impl<F> fmt::Debug for HookDefinition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDefinition")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

/// 构造后钩子
pub type PostConstructHook = HookDefinition<PostConstructFn>;

/// 销毁前钩子
pub type PreDestroyHook = HookDefinition<PreDestroyFn>;

/// 继承链上的一层钩子
///
/// 第 0 层是具体类型本身，之后每一层是更上层的祖先。
#[derive(Debug, Clone)]
pub struct HookLayer {
    declared_on: &'static str,
    post_construct: Vec<PostConstructHook>,
    pre_destroy: Vec<PreDestroyHook>,
}

impl HookLayer {
    fn new(declared_on: &'static str) -> Self {
        Self {
            declared_on,
            post_construct: Vec::new(),
            pre_destroy: Vec::new(),
        }
    }

    /// 声明这些钩子的类型名称
    pub const fn declared_on(&self) -> &'static str {
        self.declared_on
    }

    /// 构造后钩子，按声明顺序
    pub fn post_construct_hooks(&self) -> &[PostConstructHook] {
        &self.post_construct
    }

    /// 销毁前钩子，按声明顺序
    pub fn pre_destroy_hooks(&self) -> &[PreDestroyHook] {
        &self.pre_destroy
    }

    fn push_post_construct<T, F>(&mut self, name: String, requirements: Vec<Requirement>, hook: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&mut T, &mut Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let invoke: PostConstructFn = Arc::new(move |target, arguments| {
            let target = target
                .downcast_mut::<T>()
                .ok_or_else(|| Box::new(mismatch::<T>("其他实例类型")) as BoxError)?;
            hook(target, arguments)
        });
        self.post_construct.push(HookDefinition {
            name,
            requirements,
            invoke,
        });
    }

    fn push_pre_destroy<T, F>(&mut self, name: String, requirements: Vec<Requirement>, hook: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &mut Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let invoke: PreDestroyFn = Arc::new(move |target, arguments| {
            let target = target
                .downcast_ref::<T>()
                .ok_or_else(|| Box::new(mismatch::<T>("其他实例类型")) as BoxError)?;
            hook(target, arguments)
        });
        self.pre_destroy.push(HookDefinition {
            name,
            requirements,
            invoke,
        });
    }
}

/// 定时方法定义
#[derive(Clone)]
pub struct PeriodicMethod {
    name: String,
    schedule: Schedule,
    invoke: PeriodicFn,
}

impl PeriodicMethod {
    /// 方法名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 调度参数
    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// 在已构建的实例上调用一次
    pub fn invoke(&self, instance: &(dyn Any + Send + Sync)) -> Result<(), BoxError> {
        (self.invoke)(instance)
    }
}

impl fmt::Debug for PeriodicMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicMethod")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

/// 组件定义
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    type_info: TypeInfo,
    lazy: bool,
    constructors: Vec<ConstructorDefinition>,
    fields: Vec<FieldInjection>,
    hook_layers: Vec<HookLayer>,
    periodic_methods: Vec<PeriodicMethod>,
}

impl ComponentDefinition {
    /// 为类型 `T` 创建定义构建器
    pub fn builder<T: Send + Sync + 'static>() -> ComponentDefinitionBuilder<T> {
        ComponentDefinitionBuilder::new()
    }

    /// 组件类型
    pub const fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 是否延迟初始化
    pub const fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// 全部构造函数
    pub fn constructors(&self) -> &[ConstructorDefinition] {
        &self.constructors
    }

    /// 字段注入，按声明顺序
    pub fn field_injections(&self) -> &[FieldInjection] {
        &self.fields
    }

    /// 钩子层，从具体类型开始逐层向上
    pub fn hook_layers(&self) -> &[HookLayer] {
        &self.hook_layers
    }

    /// 定时方法
    pub fn periodic_methods(&self) -> &[PeriodicMethod] {
        &self.periodic_methods
    }

    /// 是否需要在启动时立即构建：非延迟组件，或拥有定时方法的延迟组件
    pub fn requires_eager_init(&self) -> bool {
        !self.lazy || !self.periodic_methods.is_empty()
    }
}

/// 组件定义构建器
pub struct ComponentDefinitionBuilder<T> {
    definition: ComponentDefinition,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ComponentDefinitionBuilder<T> {
    /// 创建新的构建器
    pub fn new() -> Self {
        let type_info = TypeInfo::of::<T>();
        Self {
            definition: ComponentDefinition {
                type_info,
                lazy: false,
                constructors: Vec::new(),
                fields: Vec::new(),
                hook_layers: vec![HookLayer::new(type_info.short_name())],
                periodic_methods: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// 标记为延迟初始化
    pub fn lazy(mut self) -> Self {
        self.definition.lazy = true;
        self
    }

    /// 设置无参构造函数
    pub fn constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.definition.constructors.push(ConstructorDefinition {
            requirements: Vec::new(),
            injectable: false,
            construct: Arc::new(move |_| construct().map(|instance| Box::new(instance) as BoxedInstance)),
        });
        self
    }

    /// 以 `Default` 作为无参构造函数
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(|| Ok(T::default()))
    }

    /// 添加注入构造函数，参数按 `requirements` 的顺序解析
    pub fn injectable_constructor<F>(mut self, requirements: Vec<Requirement>, construct: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.definition.constructors.push(ConstructorDefinition {
            requirements,
            injectable: true,
            construct: Arc::new(move |arguments| {
                construct(arguments).map(|instance| Box::new(instance) as BoxedInstance)
            }),
        });
        self
    }

    /// 添加组件字段注入
    pub fn inject_field<U, F>(mut self, name: &'static str, assign: F) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(&mut T, Arc<U>) + Send + Sync + 'static,
    {
        let apply: FieldFn = Arc::new(move |target, argument| {
            let target = target.downcast_mut::<T>().ok_or_else(|| mismatch::<T>("其他实例类型"))?;
            assign(target, argument.into_component::<U>()?);
            Ok(())
        });
        self.definition.fields.push(FieldInjection {
            name,
            requirement: Requirement::component::<U>(),
            apply,
        });
        self
    }

    /// 添加配置值字段注入，键不存在时传入 `None`
    pub fn value_field<V, F>(mut self, name: &'static str, key: impl Into<String>, assign: F) -> Self
    where
        V: Send + Sync + 'static,
        F: Fn(&mut T, Option<V>) + Send + Sync + 'static,
    {
        let apply: FieldFn = Arc::new(move |target, argument| {
            let target = target.downcast_mut::<T>().ok_or_else(|| mismatch::<T>("其他实例类型"))?;
            assign(target, argument.into_value::<V>()?);
            Ok(())
        });
        self.definition.fields.push(FieldInjection {
            name,
            requirement: Requirement::value::<V>(key),
            apply,
        });
        self
    }

    /// 在具体类型层添加构造后钩子
    pub fn post_construct<F>(mut self, name: impl Into<String>, requirements: Vec<Requirement>, hook: F) -> Self
    where
        F: Fn(&mut T, &mut Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.concrete_layer()
            .push_post_construct::<T, F>(name.into(), requirements, hook);
        self
    }

    /// 在具体类型层添加销毁前钩子
    pub fn pre_destroy<F>(mut self, name: impl Into<String>, requirements: Vec<Requirement>, hook: F) -> Self
    where
        F: Fn(&T, &mut Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.concrete_layer()
            .push_pre_destroy::<T, F>(name.into(), requirements, hook);
        self
    }

    /// 追加一层祖先钩子，每次调用向上一层
    pub fn extends<F>(mut self, ancestor: &'static str, configure: F) -> Self
    where
        F: FnOnce(HookLayerBuilder<T>) -> HookLayerBuilder<T>,
    {
        let layer = configure(HookLayerBuilder {
            layer: HookLayer::new(ancestor),
            _marker: PhantomData,
        });
        self.definition.hook_layers.push(layer.layer);
        self
    }

    /// 添加定时方法
    pub fn scheduled<F>(mut self, name: impl Into<String>, schedule: Schedule, method: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let invoke: PeriodicFn = Arc::new(move |instance| {
            let instance = instance
                .downcast_ref::<T>()
                .ok_or_else(|| Box::new(mismatch::<T>("其他实例类型")) as BoxError)?;
            method(instance)
        });
        self.definition.periodic_methods.push(PeriodicMethod {
            name: name.into(),
            schedule,
            invoke,
        });
        self
    }

    /// 完成构建
    pub fn build(self) -> ComponentDefinition {
        self.definition
    }

    fn concrete_layer(&mut self) -> &mut HookLayer {
        &mut self.definition.hook_layers[0]
    }
}

impl<T: Send + Sync + 'static> Default for ComponentDefinitionBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 祖先钩子层构建器
pub struct HookLayerBuilder<T> {
    layer: HookLayer,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> HookLayerBuilder<T> {
    /// 添加构造后钩子
    pub fn post_construct<F>(mut self, name: impl Into<String>, requirements: Vec<Requirement>, hook: F) -> Self
    where
        F: Fn(&mut T, &mut Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.layer
            .push_post_construct::<T, F>(name.into(), requirements, hook);
        self
    }

    /// 添加销毁前钩子
    pub fn pre_destroy<F>(mut self, name: impl Into<String>, requirements: Vec<Requirement>, hook: F) -> Self
    where
        F: Fn(&T, &mut Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.layer
            .push_pre_destroy::<T, F>(name.into(), requirements, hook);
        self
    }
}
