//! 生命周期管理器
//!
//! 沿钩子层从具体类型向上遍历，每个签名在一次遍历中至多调用一次

use crate::injector::Injector;
use di_abstractions::ResolveContext;
use infrastructure_common::{
    ComponentDefinition, DependencyError, HookPhase, LifecycleHookTable,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

/// 生命周期管理器
#[derive(Debug, Default, Clone, Copy)]
pub struct LifecycleManager;

impl LifecycleManager {
    /// 创建新的生命周期管理器
    pub fn new() -> Self {
        Self
    }

    /// 调用构造后钩子，任一失败即中止
    pub fn post_construct(
        &self,
        definition: &ComponentDefinition,
        instance: &mut (dyn Any + Send + Sync),
        injector: &Injector<'_>,
        context: &mut ResolveContext,
    ) -> Result<(), DependencyError> {
        let mut table = LifecycleHookTable::new();

        for layer in definition.hook_layers() {
            for hook in layer.post_construct_hooks() {
                let signature = hook.signature();
                if !table.mark_invoked(signature.clone()) {
                    debug!("跳过已调用的 {}: {}::{}", HookPhase::PostConstruct, layer.declared_on(), signature);
                    continue;
                }

                debug!("调用 {}: {}::{}", HookPhase::PostConstruct, layer.declared_on(), signature);
                let mut arguments = injector.resolve_arguments(hook.requirements(), context)?;
                hook.invoke(instance, &mut arguments)
                    .map_err(|source| DependencyError::LifecycleInvocationFailed {
                        hook: signature.to_string(),
                        declared_on: layer.declared_on().to_string(),
                        source,
                    })?;
            }
        }

        Ok(())
    }

    /// 调用销毁前钩子，失败只记录日志，返回失败数量
    pub fn pre_destroy(
        &self,
        definition: &ComponentDefinition,
        instance: &(dyn Any + Send + Sync),
        injector: &Injector<'_>,
    ) -> usize {
        let mut table = LifecycleHookTable::new();
        let mut failures = 0;

        for layer in definition.hook_layers() {
            for hook in layer.pre_destroy_hooks() {
                let signature = hook.signature();
                if !table.mark_invoked(signature.clone()) {
                    continue;
                }

                debug!("调用 {}: {}::{}", HookPhase::PreDestroy, layer.declared_on(), signature);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    injector
                        .resolve_arguments(hook.requirements(), &mut ResolveContext::new())
                        .map_err(Into::into)
                        .and_then(|mut arguments| hook.invoke(instance, &mut arguments))
                }));

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        failures += 1;
                        error!(
                            "{} 调用失败: {}::{}, 错误: {}",
                            HookPhase::PreDestroy,
                            layer.declared_on(),
                            signature,
                            e
                        );
                    }
                    Err(payload) => {
                        failures += 1;
                        error!(
                            "{} 调用发生 panic: {}::{}, 信息: {}",
                            HookPhase::PreDestroy,
                            layer.declared_on(),
                            signature,
                            panic_message(payload.as_ref())
                        );
                    }
                }
            }
        }

        failures
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<非字符串 panic>")
}
