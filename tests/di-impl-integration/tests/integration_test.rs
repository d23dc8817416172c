//! 组件注册表的集中集成测试
use config_impl::ConfigStore;
use di_abstractions::{ComponentDiscovery, ComponentRegistry, ComponentRegistryExt, DiscoveryCriteria, ResolveContext};
use di_impl::{ComponentRegistryImpl, StaticComponentDiscovery};
use infrastructure_common::{
    ComponentDefinition, ConfigEnum, ConfigError, ConfigValue, DependencyError, FlatConfig, LifecycleState,
    Requirement, TypeInfo,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Level {
    Debug,
    Info,
}

impl ConfigEnum for Level {
    fn constants() -> &'static [Self] {
        const CONSTANTS: &[Level] = &[Level::Debug, Level::Info];
        CONSTANTS
    }

    fn constant_name(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
        }
    }
}

fn registry(values: FlatConfig) -> ComponentRegistryImpl {
    ComponentRegistryImpl::new(Arc::new(ConfigStore::new(values).with_enum::<Level>()))
}

/// 测试组件
#[derive(Debug)]
struct Logger {
    level: Level,
}

#[derive(Default)]
struct Auditor {
    logger: Option<Arc<Logger>>,
    prefix: String,
}

fn logger() -> ComponentDefinition {
    ComponentDefinition::builder::<Logger>()
        .injectable_constructor(vec![Requirement::value::<Level>("log.level")], |args| {
            Ok(Logger {
                level: args.value::<Level>()?.unwrap_or(Level::Info),
            })
        })
        .build()
}

#[tokio::test]
async fn test_static_discovery_feeds_registry() -> anyhow::Result<()> {
    let discovery = StaticComponentDiscovery::new(vec![logger()]);
    let registry = registry(FlatConfig::from([(
        "log.level".to_string(),
        ConfigValue::from("DEBUG"),
    )]));
    for definition in discovery.discover(&DiscoveryCriteria::default()).await? {
        registry.register(definition)?;
    }

    assert!(registry.is_registered::<Logger>());
    assert_eq!(registry.get::<Logger>()?.level, Level::Debug);
    assert_eq!(registry.registered_types(), vec![TypeInfo::of::<Logger>()]);
    Ok(())
}

#[test]
fn test_absent_value_falls_back_in_constructor() -> anyhow::Result<()> {
    let registry = registry(FlatConfig::new());
    registry.register(logger())?;
    assert_eq!(registry.get::<Logger>()?.level, Level::Info);
    Ok(())
}

#[test]
fn test_unknown_enum_value_fails_get() {
    let registry = registry(FlatConfig::from([(
        "log.level".to_string(),
        ConfigValue::from("TRACE"),
    )]));
    registry.register(logger()).unwrap();

    match registry.get::<Logger>() {
        Err(DependencyError::Config {
            source: ConfigError::UnknownEnumValue { value, .. },
        }) => assert_eq!(value, "TRACE"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
    assert_eq!(
        registry.state(std::any::TypeId::of::<Logger>()),
        Some(LifecycleState::Uninitialized)
    );
}

#[test]
fn test_hook_arguments_are_resolved_like_constructor_arguments() {
    let registry = registry(FlatConfig::from([(
        "audit.prefix".to_string(),
        ConfigValue::from("[audit]"),
    )]));
    registry.register(logger()).unwrap();
    registry
        .register(
            ComponentDefinition::builder::<Auditor>()
                .default_constructor()
                .post_construct(
                    "attach",
                    vec![Requirement::component::<Logger>(), Requirement::value::<String>("audit.prefix")],
                    |auditor, args| {
                        auditor.logger = Some(args.component::<Logger>()?);
                        auditor.prefix = args.required_value::<String>()?;
                        Ok(())
                    },
                )
                .build(),
        )
        .unwrap();

    let auditor = registry.get::<Auditor>().unwrap();
    assert_eq!(auditor.prefix, "[audit]");
    assert!(Arc::ptr_eq(auditor.logger.as_ref().unwrap(), &registry.get::<Logger>().unwrap()));
}

#[test]
fn test_no_suitable_constructor() {
    struct Orphan;

    let registry = registry(FlatConfig::new());
    registry
        .register(ComponentDefinition::builder::<Orphan>().build())
        .unwrap();
    assert!(matches!(
        registry.get::<Orphan>(),
        Err(DependencyError::NoSuitableConstructor { .. })
    ));
}

#[test]
fn test_cycle_through_hook_argument() {
    #[derive(Default)]
    struct Alpha;
    struct Beta;

    let registry = registry(FlatConfig::new());
    registry
        .register(
            ComponentDefinition::builder::<Alpha>()
                .default_constructor()
                .post_construct("link", vec![Requirement::component::<Beta>()], |_, _| Ok(()))
                .build(),
        )
        .unwrap();
    registry
        .register(
            ComponentDefinition::builder::<Beta>()
                .injectable_constructor(vec![Requirement::component::<Alpha>()], |_| Ok(Beta))
                .build(),
        )
        .unwrap();

    match registry.get::<Alpha>() {
        Err(DependencyError::CircularDependency { dependency_chain }) => {
            assert_eq!(dependency_chain, "Alpha -> Beta -> Alpha");
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_resolve_through_trait_object() {
    #[derive(Default)]
    struct Shared;

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let registry = registry(FlatConfig::new());
    registry
        .register(
            ComponentDefinition::builder::<Shared>()
                .constructor(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Shared)
                })
                .build(),
        )
        .unwrap();

    let dynamic: &dyn ComponentRegistry = &registry;
    let first = dynamic
        .resolve(TypeInfo::of::<Shared>(), &mut ResolveContext::new())
        .unwrap();
    let second = dynamic.get::<Shared>().unwrap();
    assert!(Arc::ptr_eq(&first.downcast::<Shared>().unwrap(), &second));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(dynamic.find::<Logger>().unwrap().is_none());
}
