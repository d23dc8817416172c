//! 配置存储
//!
//! 启动后只读的扁平键值表，查找时按请求的类型强制转换。

use config_abstractions::ConfigResolver;
use infrastructure_common::{
    coerce_enum, config_enum_coercer, CoercedValue, ConfigCoercer, ConfigEnum, ConfigError,
    ConfigValue, FlatConfig, TypeInfo,
};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// 按目标类型的文本解析规则转换
fn coerce_parsed<V>(value: &ConfigValue) -> Result<CoercedValue, ConfigError>
where
    V: FromStr + Send + Sync + 'static,
    V::Err: Display,
{
    let text = value.to_string();
    text.parse::<V>()
        .map(|parsed| Box::new(parsed) as CoercedValue)
        .map_err(|e| ConfigError::InvalidValue {
            type_name: std::any::type_name::<V>().to_string(),
            value: text.clone(),
            reason: e.to_string(),
        })
}

/// 序列原样传递，不转换元素
fn coerce_list(value: &ConfigValue) -> Result<CoercedValue, ConfigError> {
    match value {
        ConfigValue::List(items) => Ok(Box::new(items.clone())),
        other => Err(ConfigError::TypeConversionError {
            message: format!("期望序列，实际为 {}: {}", other.kind(), other),
        }),
    }
}

/// 内置的类型转换表
fn builtin_coercers() -> HashMap<TypeId, ConfigCoercer> {
    let mut coercers: HashMap<TypeId, ConfigCoercer> = HashMap::new();
    coercers.insert(TypeId::of::<String>(), coerce_parsed::<String>);
    coercers.insert(TypeId::of::<bool>(), coerce_parsed::<bool>);
    coercers.insert(TypeId::of::<i8>(), coerce_parsed::<i8>);
    coercers.insert(TypeId::of::<i16>(), coerce_parsed::<i16>);
    coercers.insert(TypeId::of::<i32>(), coerce_parsed::<i32>);
    coercers.insert(TypeId::of::<i64>(), coerce_parsed::<i64>);
    coercers.insert(TypeId::of::<isize>(), coerce_parsed::<isize>);
    coercers.insert(TypeId::of::<u8>(), coerce_parsed::<u8>);
    coercers.insert(TypeId::of::<u16>(), coerce_parsed::<u16>);
    coercers.insert(TypeId::of::<u32>(), coerce_parsed::<u32>);
    coercers.insert(TypeId::of::<u64>(), coerce_parsed::<u64>);
    coercers.insert(TypeId::of::<usize>(), coerce_parsed::<usize>);
    coercers.insert(TypeId::of::<f32>(), coerce_parsed::<f32>);
    coercers.insert(TypeId::of::<f64>(), coerce_parsed::<f64>);
    coercers.insert(TypeId::of::<Vec<ConfigValue>>(), coerce_list);
    coercers
}

/// 配置存储
#[derive(Debug)]
pub struct ConfigStore {
    values: RwLock<FlatConfig>,
    coercers: HashMap<TypeId, ConfigCoercer>,
}

impl ConfigStore {
    /// 创建新的配置存储
    pub fn new(values: FlatConfig) -> Self {
        Self {
            values: RwLock::new(values),
            coercers: builtin_coercers(),
        }
    }

    /// 创建空的配置存储
    pub fn empty() -> Self {
        Self::new(FlatConfig::new())
    }

    /// 注册自定义转换函数
    pub fn with_coercer<V: 'static>(mut self, coercer: ConfigCoercer) -> Self {
        self.coercers.insert(TypeId::of::<V>(), coercer);
        self
    }

    /// 注册可注入的枚举
    pub fn with_enum<E: ConfigEnum>(self) -> Self {
        self.with_coercer::<E>(coerce_enum::<E>)
    }

    /// 按 `TypeId` 注册转换函数
    pub fn insert_coercer(&mut self, type_id: TypeId, coercer: ConfigCoercer) {
        self.coercers.insert(type_id, coercer);
    }

    /// 配置项数量
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// 清空所有配置项
    pub fn clear(&self) {
        self.values.write().clear();
    }

    fn coercer_for(&self, type_id: TypeId) -> Option<ConfigCoercer> {
        self.coercers
            .get(&type_id)
            .copied()
            .or_else(|| config_enum_coercer(type_id))
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConfigResolver for ConfigStore {
    fn resolve_erased(&self, value_type: TypeInfo, key: &str) -> Result<Option<CoercedValue>, ConfigError> {
        let Some(value) = self.raw(key) else {
            debug!("配置键不存在: {}", key);
            return Ok(None);
        };

        let coercer = self
            .coercer_for(value_type.id)
            .ok_or_else(|| ConfigError::UnsupportedConfigType {
                type_name: value_type.name.to_string(),
            })?;

        debug!("解析配置值: {} -> {}", key, value_type);
        coercer(&value).map(Some)
    }

    fn raw(&self, key: &str) -> Option<ConfigValue> {
        self.values.read().get(key).cloned()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
