//! 组件生命周期管理

use std::collections::HashSet;
use std::fmt;

/// 组件生命周期状态
///
/// 只会从 `Uninitialized` 迁移到 `Ready` 一次，不会回退。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// 未初始化
    #[default]
    Uninitialized,
    /// 已就绪
    Ready,
}

/// 生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// 构造完成后
    PostConstruct,
    /// 销毁前
    PreDestroy,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostConstruct => f.write_str("post_construct"),
            Self::PreDestroy => f.write_str("pre_destroy"),
        }
    }
}

/// 钩子签名：方法名 + 参数类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookSignature {
    pub name: String,
    pub parameter_types: Vec<&'static str>,
}

impl HookSignature {
    /// 创建新的钩子签名
    pub fn new(name: impl Into<String>, parameter_types: Vec<&'static str>) -> Self {
        Self {
            name: name.into(),
            parameter_types,
        }
    }
}

impl fmt::Display for HookSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.parameter_types.join(", "))
    }
}

/// 单次继承链遍历中已调用的钩子签名
#[derive(Debug, Default)]
pub struct LifecycleHookTable {
    invoked: HashSet<HookSignature>,
}

impl LifecycleHookTable {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记签名已调用；若此前已调用过返回 `false`
    pub fn mark_invoked(&mut self, signature: HookSignature) -> bool {
        self.invoked.insert(signature)
    }

    /// 是否已调用
    pub fn is_invoked(&self, signature: &HookSignature) -> bool {
        self.invoked.contains(signature)
    }

    /// 已调用的签名数量
    pub fn len(&self) -> usize {
        self.invoked.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.invoked.is_empty()
    }
}
