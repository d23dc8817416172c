//! 组件宏集成测试
//!
//! 每个测试使用独立的模块作为扫描根，互不干扰。

use component_macros::{Component, ConfigEnum};
use infrastructure_common::{
    component_registrations, BoxError, ComponentDefinition, Component as _, DependencyError, InfrastructureError,
    LifecycleState, TimeUnit,
};
use infrastructure_composition::ApplicationContext;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, ConfigEnum)]
pub enum Mode {
    Fast,
    Slow,
    #[config_enum(name = "burst")]
    Burst,
}

mod orders {
    use super::*;

    pub static DESTROYED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Component, Default)]
    pub struct OrderRepository {
        #[value("orders.url")]
        pub url: String,
    }

    #[derive(Component)]
    #[component(post_construct = "init", pre_destroy = "shutdown")]
    pub struct OrderService {
        #[inject]
        pub repository: Arc<OrderRepository>,
        #[value("orders.retries")]
        pub retries: i32,
        #[value("orders.mode")]
        pub mode: Mode,
        #[value("orders.label")]
        pub label: Option<String>,
        pub initialized: bool,
    }

    impl OrderService {
        fn init(&mut self) -> Result<(), BoxError> {
            self.initialized = true;
            Ok(())
        }

        fn shutdown(&self) -> Result<(), BoxError> {
            DESTROYED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Component)]
    #[component(lazy, pre_destroy = "shutdown")]
    pub struct ReportService;

    impl ReportService {
        fn shutdown(&self) -> Result<(), BoxError> {
            DESTROYED.fetch_add(100, Ordering::SeqCst);
            Ok(())
        }
    }
}

mod polling {
    use super::*;

    #[derive(Component, Default)]
    #[component(lazy, scheduled(method = "poll", fixed_delay = 10, unit = "milliseconds"))]
    pub struct Poller {
        pub polls: AtomicUsize,
    }

    impl Poller {
        fn poll(&self) -> Result<(), std::io::Error> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

mod invalid {
    use super::*;

    #[derive(Component)]
    #[component(scheduled(method = "never", fixed_delay = 0))]
    pub struct Misconfigured;

    impl Misconfigured {
        fn never(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }
}

mod broken {
    use super::*;

    #[derive(Component)]
    pub struct NeedsMissingKey {
        #[value("broken.required")]
        pub required: u64,
    }
}

#[tokio::test]
async fn test_derived_components_are_wired() {
    let mut file = tempfile::Builder::new().suffix(".properties").tempfile().unwrap();
    writeln!(file, "orders.url=postgres://localhost/orders\norders.retries=3\norders.mode=FAST").unwrap();

    let context = ApplicationContext::new("integration_tests::orders", Some(file.path()))
        .await
        .unwrap();

    let service = context.get_component::<orders::OrderService>().unwrap();
    assert_eq!(service.retries, 3);
    assert_eq!(service.mode, Mode::Fast);
    assert_eq!(service.label, None);
    assert!(service.initialized);
    assert_eq!(service.repository.url, "postgres://localhost/orders");

    let repository = context.get_component::<orders::OrderRepository>().unwrap();
    assert!(Arc::ptr_eq(&service.repository, &repository));

    assert_eq!(context.component_state::<orders::ReportService>(), Some(LifecycleState::Uninitialized));
    assert!(!context.is_registered::<polling::Poller>());

    context.close().await;
    // 未构建的延迟组件不会收到销毁调用
    assert_eq!(orders::DESTROYED.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lazy_scheduled_component_runs() {
    let context = ApplicationContext::builder()
        .scan("integration_tests::polling")
        .build()
        .await
        .unwrap();

    assert_eq!(context.component_state::<polling::Poller>(), Some(LifecycleState::Ready));
    let activities = context.scheduled_activities();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].schedule.unit, TimeUnit::Milliseconds);

    tokio::time::sleep(Duration::from_millis(100)).await;
    context.close().await;

    let poller = polling::Poller::definition();
    assert!(poller.is_lazy());
    assert!(poller.requires_eager_init());
}

#[tokio::test]
async fn test_zero_fixed_delay_fails_startup() {
    let err = ApplicationContext::builder()
        .scan("integration_tests::invalid")
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, InfrastructureError::SchedulerError { .. }));
}

#[tokio::test]
async fn test_missing_required_value_fails_construction() {
    let err = ApplicationContext::builder()
        .scan("integration_tests::broken")
        .build()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InfrastructureError::DependencyError {
            source: DependencyError::Config { .. }
        }
    ));
}

#[tokio::test]
async fn test_value_override_and_enum_names() {
    let context = ApplicationContext::builder()
        .scan("integration_tests::broken")
        .with_value("broken.required", 42)
        .with_value("mode", "burst")
        .build()
        .await
        .unwrap();

    assert_eq!(context.get_component::<broken::NeedsMissingKey>().unwrap().required, 42);
    assert_eq!(context.get_config_value::<Mode>("mode").unwrap(), Mode::Burst);
    context.close().await;
}

#[test]
fn test_registrations_carry_module_path() {
    let registrations = component_registrations();
    let poller = registrations
        .iter()
        .find(|registration| registration.type_name.ends_with("Poller"))
        .unwrap();
    assert_eq!(poller.module_path, "integration_tests::polling");

    let definition: ComponentDefinition = (poller.definition)();
    assert_eq!(definition.periodic_methods().len(), 1);
    assert_eq!(definition.periodic_methods()[0].name(), "poll");
}
