//! 定时任务调度器
//!
//! 在环境 tokio 运行时上为每个定时方法运行一个循环任务。执行使用固定延迟语义：
//! 上一次调用结束后等待 `fixed_delay` 再开始下一次。工作池大小由信号量限制，
//! 每次调用在 `spawn_blocking` 中持有一个许可执行。

use di_abstractions::{ComponentRegistry, ResolveContext};
use di_impl::{ComponentDescriptor, ComponentRegistryImpl};
use infrastructure_common::{
    ComponentDefinition, ErasedInstance, InfrastructureError, PeriodicMethod, Schedule, SchedulerError,
    TypeInfo,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// 已创建
    Created,
    /// 运行中
    Running,
    /// 已停止（终态）
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("Created"),
            Self::Running => f.write_str("Running"),
            Self::Stopped => f.write_str("Stopped"),
        }
    }
}

/// 已注册的周期性活动
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledActivity {
    /// 所属组件
    pub component: TypeInfo,
    /// 方法名
    pub method: String,
    /// 调度参数
    pub schedule: Schedule,
}

/// 校验所有定时方法的调度参数
pub fn validate_schedules<'a, I>(definitions: I) -> Result<(), SchedulerError>
where
    I: IntoIterator<Item = &'a ComponentDefinition>,
{
    for definition in definitions {
        for method in definition.periodic_methods() {
            if !method.schedule().is_valid() {
                return Err(SchedulerError::InvalidSchedule {
                    type_name: definition.type_info().name.to_string(),
                    method: method.name().to_string(),
                    fixed_delay: method.schedule().fixed_delay,
                });
            }
        }
    }
    Ok(())
}

/// 定时任务调度器
pub struct TaskScheduler {
    state: Mutex<SchedulerState>,
    pool_size: usize,
    shutdown_grace: Duration,
    permits: Arc<Semaphore>,
    cancel_token: CancellationToken,
    task_tracker: TaskTracker,
    handles: Mutex<Vec<JoinHandle<()>>>,
    activities: RwLock<Vec<ScheduledActivity>>,
}

impl TaskScheduler {
    /// 创建新的调度器
    pub fn new(pool_size: usize, shutdown_grace: Duration) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            state: Mutex::new(SchedulerState::Created),
            pool_size,
            shutdown_grace,
            permits: Arc::new(Semaphore::new(pool_size)),
            cancel_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
            handles: Mutex::new(Vec::new()),
            activities: RwLock::new(Vec::new()),
        }
    }

    /// 当前状态
    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// 工作池大小
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// 已注册的周期性活动
    pub fn activities(&self) -> Vec<ScheduledActivity> {
        self.activities.read().clone()
    }

    /// 启动调度器
    ///
    /// 先校验全部调度参数，再按注册顺序强制构建需要立即初始化的组件
    /// （非延迟组件，或拥有定时方法的延迟组件），并为其定时方法注册周期性活动。
    pub fn start(&self, registry: &ComponentRegistryImpl) -> Result<(), InfrastructureError> {
        {
            let mut state = self.state.lock();
            if *state != SchedulerState::Created {
                return Err(SchedulerError::InvalidState {
                    expected: SchedulerState::Created.to_string(),
                    actual: state.to_string(),
                }
                .into());
            }
            *state = SchedulerState::Running;
        }
        info!("启动任务调度器，工作池大小: {}", self.pool_size);

        let descriptors = registry.descriptors();
        validate_schedules(descriptors.iter().map(|d| d.definition()))?;

        for descriptor in descriptors
            .iter()
            .filter(|d| d.definition().requires_eager_init())
        {
            self.materialize(registry, descriptor)?;
        }

        info!("任务调度器已启动，周期性活动: {} 个", self.activities.read().len());
        Ok(())
    }

    fn materialize(
        &self,
        registry: &ComponentRegistryImpl,
        descriptor: &ComponentDescriptor,
    ) -> Result<(), InfrastructureError> {
        let type_info = descriptor.type_info();
        debug!("立即初始化组件: {}", type_info);
        let instance = registry.resolve(type_info, &mut ResolveContext::new())?;

        for method in descriptor.definition().periodic_methods() {
            self.schedule(type_info, Arc::clone(&instance), method.clone());
        }
        Ok(())
    }

    fn schedule(&self, component: TypeInfo, instance: ErasedInstance, method: PeriodicMethod) {
        let schedule = *method.schedule();
        info!(
            "注册定时方法: {}::{} (initial_delay={}, fixed_delay={} {})",
            component,
            method.name(),
            schedule.initial_delay.max(0),
            schedule.fixed_delay,
            schedule.unit
        );
        self.activities.write().push(ScheduledActivity {
            component,
            method: method.name().to_string(),
            schedule,
        });

        let handle = self.task_tracker.spawn(run_activity(
            component,
            instance,
            method,
            Arc::clone(&self.permits),
            self.cancel_token.child_token(),
        ));
        self.handles.lock().push(handle);
    }

    /// 停止调度器
    ///
    /// 发出停止信号后在宽限期内等待正在执行的调用完成，超时后强制取消剩余任务。
    /// 宽限期内全部完成时返回 `true`。
    pub async fn stop(&self) -> bool {
        if !self.begin_stop() {
            return true;
        }

        let completed = tokio::time::timeout(self.shutdown_grace, self.task_tracker.wait())
            .await
            .is_ok();
        if completed {
            info!("任务调度器已停止");
        } else {
            warn!(
                "等待 {:?} 后仍有 {} 个活动未结束，强制取消",
                self.shutdown_grace,
                self.task_tracker.len()
            );
            self.abort_all();
        }
        completed
    }

    /// 立即停止调度器，不等待正在执行的调用
    pub fn stop_now(&self) {
        if self.begin_stop() {
            self.abort_all();
            info!("任务调度器已强制停止");
        }
    }

    /// 转入 Stopped 并发出停止信号；已停止时返回 `false`
    fn begin_stop(&self) -> bool {
        {
            let mut state = self.state.lock();
            if *state == SchedulerState::Stopped {
                return false;
            }
            *state = SchedulerState::Stopped;
        }
        debug!("停止任务调度器");
        self.cancel_token.cancel();
        self.permits.close();
        self.task_tracker.close();
        true
    }

    fn abort_all(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}

impl fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("state", &self.state())
            .field("pool_size", &self.pool_size)
            .field("activities", &self.activities.read().len())
            .finish_non_exhaustive()
    }
}

/// 单个周期性活动的执行循环
async fn run_activity(
    component: TypeInfo,
    instance: ErasedInstance,
    method: PeriodicMethod,
    permits: Arc<Semaphore>,
    token: CancellationToken,
) {
    let schedule = *method.schedule();
    let initial_delay = schedule.initial_delay_duration();
    if !initial_delay.is_zero() {
        tokio::select! {
            () = token.cancelled() => return,
            () = tokio::time::sleep(initial_delay) => {}
        }
    }

    loop {
        let permit = tokio::select! {
            () = token.cancelled() => break,
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let target = Arc::clone(&instance);
        let task = method.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task.invoke(&*target)
        })
        .await;

        match outcome {
            Ok(Ok(())) => debug!("定时方法执行完成: {}::{}", component, method.name()),
            Ok(Err(e)) => warn!("定时方法执行失败: {}::{}, 错误: {}", component, method.name(), e),
            Err(e) if e.is_panic() => error!("定时方法发生 panic: {}::{}", component, method.name()),
            Err(_) => break,
        }

        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(schedule.delay_duration()) => {}
        }
    }

    debug!("周期性活动结束: {}::{}", component, method.name());
}
