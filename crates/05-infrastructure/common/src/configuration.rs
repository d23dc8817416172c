//! 配置相关的基础类型定义

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// 扁平化后的配置映射（键以 `.` 连接）
pub type FlatConfig = HashMap<String, ConfigValue>;

/// 类型化配置值的擦除形式
pub type CoercedValue = Box<dyn Any + Send + Sync>;

/// 配置值强制转换函数
pub type ConfigCoercer = fn(&ConfigValue) -> Result<CoercedValue, ConfigError>;

/// 未类型化的配置值
///
/// 配置源只产生标量或标量序列，具体类型在注入时按需转换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// 空值
    Null,
    /// 布尔值
    Bool(bool),
    /// 整数
    Integer(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
    /// 有序序列
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    /// 是否为序列
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// 获取序列内容
    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// 获取字符串内容（仅限字符串值）
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// 值的类型名称，用于错误消息
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            // Debug 保留小数点，避免 3.0 被渲染成 3
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<V: Into<ConfigValue>> From<Vec<V>> for ConfigValue {
    fn from(values: Vec<V>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// 可从配置注入的枚举
///
/// 配置值的字符串形式与各常量名称逐一比较，区分大小写。
/// 通常通过 `#[derive(ConfigEnum)]` 实现。
pub trait ConfigEnum: Clone + Send + Sync + 'static {
    /// 全部枚举常量，按声明顺序
    fn constants() -> &'static [Self];

    /// 常量名称
    fn constant_name(&self) -> &'static str;
}

/// 将配置值解析为枚举常量
pub fn parse_enum<E: ConfigEnum>(value: &ConfigValue) -> Result<E, ConfigError> {
    let text = value.to_string();
    E::constants()
        .iter()
        .find(|constant| constant.constant_name() == text)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownEnumValue {
            type_name: std::any::type_name::<E>().to_string(),
            value: text,
        })
}

/// 枚举类型的强制转换函数，可存入转换表
pub fn coerce_enum<E: ConfigEnum>(value: &ConfigValue) -> Result<CoercedValue, ConfigError> {
    parse_enum::<E>(value).map(|constant| Box::new(constant) as CoercedValue)
}
