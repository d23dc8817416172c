//! 类型化配置查找接口

use infrastructure_common::{CoercedValue, ConfigError, ConfigValue, TypeInfo};

/// 配置解析器 trait
///
/// 按键读取配置值并强制转换为请求的类型。键不存在时返回 `Ok(None)`，
/// 由调用方决定缺失是否可以接受。
pub trait ConfigResolver: Send + Sync {
    /// 以擦除类型解析配置值
    fn resolve_erased(&self, value_type: TypeInfo, key: &str) -> Result<Option<CoercedValue>, ConfigError>;

    /// 获取原始配置值
    fn raw(&self, key: &str) -> Option<ConfigValue>;

    /// 检查配置键是否存在
    fn contains_key(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    /// 获取所有配置键
    fn keys(&self) -> Vec<String>;
}

/// 类型化查找扩展
pub trait ConfigResolverExt: ConfigResolver {
    /// 解析配置值，键不存在时返回 `None`
    fn resolve<V: Send + Sync + 'static>(&self, key: &str) -> Result<Option<V>, ConfigError> {
        match self.resolve_erased(TypeInfo::of::<V>(), key)? {
            None => Ok(None),
            Some(value) => value
                .downcast::<V>()
                .map(|value| Some(*value))
                .map_err(|_| ConfigError::TypeConversionError {
                    message: format!("配置键 {key} 的转换结果不是 {}", std::any::type_name::<V>()),
                }),
        }
    }

    /// 解析必需的配置值，键不存在时返回 `KeyNotFound`
    fn require<V: Send + Sync + 'static>(&self, key: &str) -> Result<V, ConfigError> {
        self.resolve::<V>(key)?.ok_or_else(|| ConfigError::KeyNotFound {
            key: key.to_string(),
        })
    }
}

impl<R: ConfigResolver + ?Sized> ConfigResolverExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StringOnly(HashMap<String, ConfigValue>);

    impl ConfigResolver for StringOnly {
        fn resolve_erased(&self, value_type: TypeInfo, key: &str) -> Result<Option<CoercedValue>, ConfigError> {
            let Some(value) = self.0.get(key) else {
                return Ok(None);
            };
            if value_type.is::<String>() {
                Ok(Some(Box::new(value.to_string())))
            } else {
                Err(ConfigError::UnsupportedConfigType {
                    type_name: value_type.name.to_string(),
                })
            }
        }

        fn raw(&self, key: &str) -> Option<ConfigValue> {
            self.0.get(key).cloned()
        }

        fn keys(&self) -> Vec<String> {
            self.0.keys().cloned().collect()
        }
    }

    fn resolver() -> StringOnly {
        StringOnly(HashMap::from([("name".to_string(), ConfigValue::from("lorn"))]))
    }

    #[test]
    fn test_typed_resolve() {
        let resolver = resolver();
        assert_eq!(resolver.resolve::<String>("name").unwrap().as_deref(), Some("lorn"));
        assert_eq!(resolver.resolve::<String>("missing").unwrap(), None);
        assert!(resolver.contains_key("name"));
    }

    #[test]
    fn test_require_missing_key() {
        let err = resolver().require::<String>("missing").unwrap_err();
        assert!(matches!(err, ConfigError::KeyNotFound { ref key } if key == "missing"));
    }

    #[test]
    fn test_dyn_resolver() {
        let resolver: Box<dyn ConfigResolver> = Box::new(resolver());
        assert!(matches!(
            resolver.resolve::<i32>("name"),
            Err(ConfigError::UnsupportedConfigType { .. })
        ));
    }
}
