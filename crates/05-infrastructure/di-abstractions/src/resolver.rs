//! 组件解析上下文
//!
//! 记录当前正在解析的类型链，用于检测循环依赖

use infrastructure_common::{DependencyError, TypeInfo};

/// 解析上下文
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    pub resolution_chain: Vec<TypeInfo>,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加类型到解析链，类型已在链中时返回循环依赖错误
    pub fn push_type(&mut self, type_info: TypeInfo) -> Result<(), DependencyError> {
        if self.contains(&type_info) {
            return Err(DependencyError::CircularDependency {
                dependency_chain: self.describe_cycle(&type_info),
            });
        }
        self.resolution_chain.push(type_info);
        Ok(())
    }

    /// 从解析链中移除类型
    pub fn pop_type(&mut self) {
        self.resolution_chain.pop();
    }

    /// 类型是否正在解析
    pub fn contains(&self, type_info: &TypeInfo) -> bool {
        self.resolution_chain.iter().any(|t| t.id == type_info.id)
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 从首次出现处开始描述环路，例如 `A -> B -> A`
    fn describe_cycle(&self, revisited: &TypeInfo) -> String {
        let start = self
            .resolution_chain
            .iter()
            .position(|t| t.id == revisited.id)
            .unwrap_or(0);
        self.resolution_chain[start..]
            .iter()
            .chain(std::iter::once(revisited))
            .map(TypeInfo::short_name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;
    struct C;

    #[test]
    fn test_push_and_pop() {
        let mut context = ResolveContext::new();
        context.push_type(TypeInfo::of::<A>()).unwrap();
        context.push_type(TypeInfo::of::<B>()).unwrap();
        assert_eq!(context.depth(), 2);
        context.pop_type();
        assert!(!context.contains(&TypeInfo::of::<B>()));
        context.push_type(TypeInfo::of::<B>()).unwrap();
    }

    #[test]
    fn test_cycle_description() {
        let mut context = ResolveContext::new();
        context.push_type(TypeInfo::of::<C>()).unwrap();
        context.push_type(TypeInfo::of::<A>()).unwrap();
        context.push_type(TypeInfo::of::<B>()).unwrap();

        let err = context.push_type(TypeInfo::of::<A>()).unwrap_err();
        match err {
            DependencyError::CircularDependency { dependency_chain } => {
                assert_eq!(dependency_chain, "A -> B -> A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
