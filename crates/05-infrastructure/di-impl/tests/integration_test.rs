//! 依赖注入实现的集成测试

use config_impl::ConfigStore;
use di_abstractions::{ComponentRegistry, ComponentRegistryExt};
use di_impl::ComponentRegistryImpl;
use infrastructure_common::{
    Arguments, BoxError, ComponentDefinition, ConfigValue, DependencyError, FlatConfig, LifecycleState, Requirement,
};
use parking_lot::Mutex;
use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn registry_with(values: FlatConfig) -> ComponentRegistryImpl {
    ComponentRegistryImpl::new(Arc::new(ConfigStore::new(values)))
}

fn registry() -> ComponentRegistryImpl {
    registry_with(FlatConfig::new())
}

struct Ping {
    pong: Arc<Pong>,
}

struct Pong {
    _ping: Arc<Ping>,
}

#[test]
fn test_mutual_constructor_dependency_is_cyclic() {
    let registry = registry();
    registry
        .register(
            ComponentDefinition::builder::<Ping>()
                .injectable_constructor(vec![Requirement::component::<Pong>()], |args| {
                    Ok(Ping {
                        pong: args.component::<Pong>()?,
                    })
                })
                .build(),
        )
        .unwrap();
    registry
        .register(
            ComponentDefinition::builder::<Pong>()
                .injectable_constructor(vec![Requirement::component::<Ping>()], |args| {
                    Ok(Pong {
                        _ping: args.component::<Ping>()?,
                    })
                })
                .build(),
        )
        .unwrap();

    let err = registry.get::<Ping>().err().unwrap();
    match err {
        DependencyError::CircularDependency { dependency_chain } => {
            assert_eq!(dependency_chain, "Ping -> Pong -> Ping");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(registry.state(TypeId::of::<Ping>()), Some(LifecycleState::Uninitialized));
    assert_eq!(registry.state(TypeId::of::<Pong>()), Some(LifecycleState::Uninitialized));
}

#[test]
fn test_self_field_injection_is_cyclic() {
    #[derive(Default)]
    struct Narcissus {
        _me: Option<Arc<Narcissus>>,
    }

    let registry = registry();
    registry
        .register(
            ComponentDefinition::builder::<Narcissus>()
                .default_constructor()
                .inject_field::<Narcissus, _>("me", |n, me| n._me = Some(me))
                .build(),
        )
        .unwrap();

    assert!(matches!(
        registry.get::<Narcissus>(),
        Err(DependencyError::CircularDependency { .. })
    ));
}

struct Repository {
    url: String,
}

#[derive(Default)]
struct Service {
    repository: Option<Arc<Repository>>,
    retries: i32,
    hosts: Vec<ConfigValue>,
}

#[test]
fn test_constructor_field_and_value_injection() {
    let values = FlatConfig::from([
        ("db.url".to_string(), ConfigValue::from("postgres://localhost")),
        ("retries".to_string(), ConfigValue::from("3")),
        ("hosts".to_string(), ConfigValue::from(vec!["a", "b"])),
    ]);
    let registry = registry_with(values);
    registry
        .register(
            ComponentDefinition::builder::<Repository>()
                .injectable_constructor(vec![Requirement::value::<String>("db.url")], |args| {
                    Ok(Repository {
                        url: args.required_value::<String>()?,
                    })
                })
                .build(),
        )
        .unwrap();
    registry
        .register(
            ComponentDefinition::builder::<Service>()
                .default_constructor()
                .inject_field::<Repository, _>("repository", |s, r| s.repository = Some(r))
                .value_field::<i32, _>("retries", "retries", |s, v| s.retries = v.unwrap_or(1))
                .value_field::<Vec<ConfigValue>, _>("hosts", "hosts", |s, v| s.hosts = v.unwrap_or_default())
                .build(),
        )
        .unwrap();

    let service = registry.get::<Service>().unwrap();
    assert_eq!(service.retries, 3);
    assert_eq!(service.hosts, vec![ConfigValue::from("a"), ConfigValue::from("b")]);

    let repository = registry.get::<Repository>().unwrap();
    assert!(Arc::ptr_eq(service.repository.as_ref().unwrap(), &repository));
    assert_eq!(repository.url, "postgres://localhost");
}

#[test]
fn test_missing_dependency_fails_get_only() {
    struct Needy;
    struct Missing;
    #[derive(Default)]
    struct Healthy;

    let registry = registry();
    registry
        .register(
            ComponentDefinition::builder::<Needy>()
                .injectable_constructor(vec![Requirement::component::<Missing>()], |_| Ok(Needy))
                .build(),
        )
        .unwrap();
    registry
        .register(ComponentDefinition::builder::<Healthy>().default_constructor().build())
        .unwrap();

    assert!(matches!(
        registry.get::<Needy>(),
        Err(DependencyError::ComponentNotRegistered { .. })
    ));
    // find 只对未注册类型返回 None，构建失败仍是错误
    assert!(registry.find::<Needy>().is_err());
    assert!(registry.get::<Healthy>().is_ok());
}

#[test]
fn test_failed_post_construct_leaves_uninitialized_and_retries() {
    #[derive(Default)]
    struct Flaky;

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let registry = registry();
    registry
        .register(
            ComponentDefinition::builder::<Flaky>()
                .default_constructor()
                .post_construct("init", vec![], move |_, _| {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("first start fails".into())
                    } else {
                        Ok(())
                    }
                })
                .build(),
        )
        .unwrap();

    let err = registry.get::<Flaky>().err().unwrap();
    assert!(matches!(err, DependencyError::LifecycleInvocationFailed { .. }));
    assert_eq!(registry.state(TypeId::of::<Flaky>()), Some(LifecycleState::Uninitialized));

    assert!(registry.get::<Flaky>().is_ok());
    assert_eq!(registry.state(TypeId::of::<Flaky>()), Some(LifecycleState::Ready));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_hooks_run_most_derived_first_once_per_signature() {
    #[derive(Default)]
    struct Derived;

    let calls = Arc::new(Mutex::new(Vec::new()));
    let record = |label: &'static str| {
        let calls = Arc::clone(&calls);
        move |_: &mut Derived, _: &mut Arguments| -> Result<(), BoxError> {
            calls.lock().push(label);
            Ok(())
        }
    };

    let values = FlatConfig::from([("port".to_string(), ConfigValue::Integer(80))]);
    let registry = registry_with(values);
    registry
        .register(
            ComponentDefinition::builder::<Derived>()
                .default_constructor()
                .post_construct("init", vec![], record("Derived::init"))
                .extends("Middle", |layer| {
                    layer
                        .post_construct("init", vec![], record("Middle::init"))
                        .post_construct("setup", vec![Requirement::value::<u16>("port")], record("Middle::setup"))
                })
                .extends("Base", |layer| {
                    layer
                        .post_construct("setup", vec![], record("Base::setup()"))
                        .post_construct("setup", vec![Requirement::value::<u16>("port")], record("Base::setup(u16)"))
                })
                .build(),
        )
        .unwrap();

    registry.get::<Derived>().unwrap();
    assert_eq!(
        *calls.lock(),
        vec!["Derived::init", "Middle::setup", "Base::setup()"]
    );
}

#[test]
fn test_destroy_only_ready_and_isolates_failures() {
    #[derive(Default)]
    struct Used;
    #[derive(Default)]
    struct Broken;
    #[derive(Default)]
    struct NeverUsed;

    let destroyed = Arc::new(Mutex::new(Vec::new()));
    let registry = registry();

    let log = Arc::clone(&destroyed);
    registry
        .register(
            ComponentDefinition::builder::<Broken>()
                .default_constructor()
                .pre_destroy("close", vec![], |_, _| Err("boom".into()))
                .extends("Base", |layer| {
                    layer.pre_destroy("release", vec![], move |_, _| {
                        log.lock().push("Broken::release");
                        Ok(())
                    })
                })
                .build(),
        )
        .unwrap();

    let log = Arc::clone(&destroyed);
    registry
        .register(
            ComponentDefinition::builder::<Used>()
                .default_constructor()
                .pre_destroy("close", vec![], move |_, _| {
                    log.lock().push("Used::close");
                    Ok(())
                })
                .build(),
        )
        .unwrap();

    let log = Arc::clone(&destroyed);
    registry
        .register(
            ComponentDefinition::builder::<NeverUsed>()
                .lazy()
                .default_constructor()
                .pre_destroy("close", vec![], move |_, _| {
                    log.lock().push("NeverUsed::close");
                    Ok(())
                })
                .build(),
        )
        .unwrap();

    registry.get::<Broken>().unwrap();
    registry.get::<Used>().unwrap();

    let failures = registry.destroy_all();
    assert_eq!(failures, 1);
    assert_eq!(*destroyed.lock(), vec!["Broken::release", "Used::close"]);

    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn test_panicking_pre_destroy_is_isolated() {
    #[derive(Default)]
    struct Exploding;
    #[derive(Default)]
    struct Survivor;

    let destroyed = Arc::new(AtomicUsize::new(0));
    let registry = registry();

    let hits = Arc::clone(&destroyed);
    registry
        .register(
            ComponentDefinition::builder::<Exploding>()
                .default_constructor()
                .pre_destroy("close", vec![], |_, _| panic!("close exploded"))
                .extends("Base", |layer| {
                    layer.pre_destroy("release", vec![], move |_, _| {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                })
                .build(),
        )
        .unwrap();

    let hits = Arc::clone(&destroyed);
    registry
        .register(
            ComponentDefinition::builder::<Survivor>()
                .default_constructor()
                .pre_destroy("close", vec![], move |_, _| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build(),
        )
        .unwrap();

    registry.get::<Exploding>().unwrap();
    registry.get::<Survivor>().unwrap();

    assert_eq!(registry.destroy_all(), 1);
    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_first_access_constructs_once() {
    struct Slow;

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let registry = Arc::new(registry());
    registry
        .register(
            ComponentDefinition::builder::<Slow>()
                .constructor(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(20));
                    Ok(Slow)
                })
                .build(),
        )
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.get::<Slow>().unwrap())
        })
        .collect();
    let instances: Vec<Arc<Slow>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_constructor_error_is_wrapped() {
    struct Failing;

    let registry = registry();
    registry
        .register(
            ComponentDefinition::builder::<Failing>()
                .constructor(|| Err("cannot connect".into()))
                .build(),
        )
        .unwrap();

    match registry.get::<Failing>() {
        Err(DependencyError::ComponentCreationFailed { source, .. }) => {
            assert_eq!(source.to_string(), "cannot connect");
        }
        other => panic!("unexpected result: {:?}", other.err()),
    }
}
