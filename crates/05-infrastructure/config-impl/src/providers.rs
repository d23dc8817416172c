//! 配置加载器实现

use async_trait::async_trait;
use config_abstractions::{ConfigFormat, ConfigLoader};
use infrastructure_common::{ConfigError, ConfigValue, FlatConfig};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// 读取配置文件内容
async fn read_source(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })
}

fn parse_error(path: &Path, source: impl std::error::Error + Send + Sync + 'static) -> ConfigError {
    ConfigError::ParseError {
        path: path.display().to_string(),
        source: Box::new(source),
    }
}

/// 将层级结构展开为以 `.` 连接的扁平映射
///
/// 根节点必须是对象。叶子上的 null 被忽略；数组整体作为有序序列保留。
pub fn flatten_value(path: &Path, value: &Value) -> Result<FlatConfig, ConfigError> {
    let Value::Object(map) = value else {
        return Err(ConfigError::ParseError {
            path: path.display().to_string(),
            source: format!("根节点必须是对象, 实际: {}", value_kind(value)).into(),
        });
    };

    let mut flat = FlatConfig::new();
    for (key, child) in map {
        flatten_into(key, child, &mut flat);
    }
    Ok(flat)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "布尔值",
        Value::Number(_) => "数字",
        Value::String(_) => "字符串",
        Value::Array(_) => "数组",
        Value::Object(_) => "对象",
    }
}

fn flatten_into(prefix: &str, value: &Value, flat: &mut FlatConfig) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&format!("{prefix}.{key}"), child, flat);
            }
        }
        other => {
            flat.insert(prefix.to_string(), to_config_value(other));
        }
    }
}

fn to_config_value(value: &Value) -> ConfigValue {
    match value {
        Value::Null => ConfigValue::Null,
        Value::Bool(b) => ConfigValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ConfigValue::Integer(i)
            } else if n.is_u64() {
                // 超出 i64 的整数保留原文
                ConfigValue::String(n.to_string())
            } else {
                ConfigValue::Float(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => ConfigValue::String(s.clone()),
        Value::Array(items) => ConfigValue::List(items.iter().map(to_config_value).collect()),
        // 序列中的对象保留为文本
        Value::Object(_) => ConfigValue::String(value.to_string()),
    }
}

/// JSON 配置加载器
#[derive(Debug, Default)]
pub struct JsonConfigLoader;

impl JsonConfigLoader {
    /// 创建新的 JSON 配置加载器
    pub fn new() -> Self {
        Self
    }

    /// 解析 JSON 文本
    pub fn parse(&self, path: &Path, content: &str) -> Result<FlatConfig, ConfigError> {
        let value: Value = serde_json::from_str(content).map_err(|e| parse_error(path, e))?;
        flatten_value(path, &value)
    }
}

#[async_trait]
impl ConfigLoader for JsonConfigLoader {
    async fn load(&self, path: &Path) -> Result<FlatConfig, ConfigError> {
        debug!("加载 JSON 配置文件: {}", path.display());
        let content = read_source(path).await?;
        self.parse(path, &content)
    }

    fn format(&self) -> ConfigFormat {
        ConfigFormat::Json
    }

    fn name(&self) -> &str {
        "JsonConfigLoader"
    }
}

/// YAML 配置加载器
#[derive(Debug, Default)]
pub struct YamlConfigLoader;

impl YamlConfigLoader {
    /// 创建新的 YAML 配置加载器
    pub fn new() -> Self {
        Self
    }

    /// 解析 YAML 文本
    pub fn parse(&self, path: &Path, content: &str) -> Result<FlatConfig, ConfigError> {
        if content.trim().is_empty() {
            return Ok(FlatConfig::new());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| parse_error(path, e))?;
        // 只有注释或文档标记的文件视为空配置
        if value.is_null() {
            return Ok(FlatConfig::new());
        }
        flatten_value(path, &Self::yaml_to_json(&value))
    }

    /// 将 YAML 值转换为 JSON 值，非字符串键取其文本形式
    fn yaml_to_json(value: &serde_yaml::Value) -> Value {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(*b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else {
                    n.as_f64()
                        .and_then(serde_json::Number::from_f64)
                        .map_or(Value::Null, Value::Number)
                }
            }
            serde_yaml::Value::String(s) => Value::String(s.clone()),
            serde_yaml::Value::Sequence(items) => Value::Array(items.iter().map(Self::yaml_to_json).collect()),
            serde_yaml::Value::Mapping(mapping) => Value::Object(
                mapping
                    .iter()
                    .map(|(k, v)| (Self::yaml_key(k), Self::yaml_to_json(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::yaml_to_json(&tagged.value),
        }
    }

    fn yaml_key(key: &serde_yaml::Value) -> String {
        match key {
            serde_yaml::Value::String(s) => s.clone(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Null => "null".to_string(),
            other => serde_yaml::to_string(other)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ConfigLoader for YamlConfigLoader {
    async fn load(&self, path: &Path) -> Result<FlatConfig, ConfigError> {
        debug!("加载 YAML 配置文件: {}", path.display());
        let content = read_source(path).await?;
        self.parse(path, &content)
    }

    fn format(&self) -> ConfigFormat {
        ConfigFormat::Yaml
    }

    fn name(&self) -> &str {
        "YamlConfigLoader"
    }
}

/// TOML 配置加载器
#[derive(Debug, Default)]
pub struct TomlConfigLoader;

impl TomlConfigLoader {
    /// 创建新的 TOML 配置加载器
    pub fn new() -> Self {
        Self
    }

    /// 解析 TOML 文本
    pub fn parse(&self, path: &Path, content: &str) -> Result<FlatConfig, ConfigError> {
        let table: toml::Table = toml::from_str(content).map_err(|e| parse_error(path, e))?;
        flatten_value(path, &Self::toml_to_json(&toml::Value::Table(table)))
    }

    /// 将 TOML 值转换为 JSON 值
    fn toml_to_json(value: &toml::Value) -> Value {
        match value {
            toml::Value::String(s) => Value::String(s.clone()),
            toml::Value::Integer(i) => Value::from(*i),
            toml::Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            toml::Value::Boolean(b) => Value::Bool(*b),
            toml::Value::Array(arr) => Value::Array(arr.iter().map(Self::toml_to_json).collect()),
            toml::Value::Table(table) => Value::Object(
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::toml_to_json(v)))
                    .collect(),
            ),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        }
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load(&self, path: &Path) -> Result<FlatConfig, ConfigError> {
        debug!("加载 TOML 配置文件: {}", path.display());
        let content = read_source(path).await?;
        self.parse(path, &content)
    }

    fn format(&self) -> ConfigFormat {
        ConfigFormat::Toml
    }

    fn name(&self) -> &str {
        "TomlConfigLoader"
    }
}

/// Properties 配置加载器
///
/// 支持 `key=value`、`key:value`、`key value` 三种分隔方式，`#` 与 `!` 开头的注释行，
/// 行尾反斜杠续行，以及 `\t \n \r \f \uXXXX` 转义。所有值均为字符串。
#[derive(Debug, Default)]
pub struct PropertiesConfigLoader;

impl PropertiesConfigLoader {
    /// 创建新的 Properties 配置加载器
    pub fn new() -> Self {
        Self
    }

    /// 解析 Properties 文本
    pub fn parse(&self, content: &str) -> FlatConfig {
        let mut flat = FlatConfig::new();
        for line in Self::logical_lines(content) {
            let (key, value) = Self::split_entry(&line);
            flat.insert(Self::unescape(key), ConfigValue::String(Self::unescape(value)));
        }
        flat
    }

    /// 合并续行，去掉注释与空行
    fn logical_lines(content: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current: Option<String> = None;

        for raw in content.lines() {
            let trimmed = raw.trim_start();
            let line = match current.take() {
                Some(mut pending) => {
                    pending.push_str(trimmed);
                    pending
                }
                None => {
                    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                        continue;
                    }
                    trimmed.to_string()
                }
            };

            if Self::ends_with_continuation(&line) {
                let mut line = line;
                line.pop();
                current = Some(line);
            } else {
                lines.push(line);
            }
        }

        if let Some(pending) = current {
            lines.push(pending);
        }
        lines
    }

    /// 行尾奇数个反斜杠表示续行
    fn ends_with_continuation(line: &str) -> bool {
        line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
    }

    /// 拆分键和值
    fn split_entry(line: &str) -> (&str, &str) {
        let mut escaped = false;
        let mut key_end = line.len();
        for (index, c) in line.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '=' | ':' | ' ' | '\t' | '\u{c}' => {
                    key_end = index;
                    break;
                }
                _ => {}
            }
        }

        let key = &line[..key_end];
        let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start_matches([' ', '\t', '\u{c}']);
        }
        (key, rest)
    }

    /// 处理转义字符
    fn unescape(text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                result.push(c);
                continue;
            }
            match chars.next() {
                Some('t') => result.push('\t'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('f') => result.push('\u{c}'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        Some(decoded) => result.push(decoded),
                        None => {
                            result.push('u');
                            result.push_str(&hex);
                        }
                    }
                }
                Some(other) => result.push(other),
                None => {}
            }
        }
        result
    }
}

#[async_trait]
impl ConfigLoader for PropertiesConfigLoader {
    async fn load(&self, path: &Path) -> Result<FlatConfig, ConfigError> {
        debug!("加载 Properties 配置文件: {}", path.display());
        let content = read_source(path).await?;
        Ok(self.parse(&content))
    }

    fn format(&self) -> ConfigFormat {
        ConfigFormat::Properties
    }

    fn name(&self) -> &str {
        "PropertiesConfigLoader"
    }
}
