//! 字段定义模块
//!
//! 定义实体字段的可移植描述，以及实体在进程间的稳定标识

use crate::types::{DataTypeKey, Kind};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// 实体键
///
/// 同一个具体类型总是得到同一个键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 由完全限定类型名生成的键
    ///
    /// `type_name` 的输出不保证在不同编译器版本之间一致，
    /// 跨进程使用时两端应由同一工具链构建，否则通过 `define_entity!` 的 `key = ...` 指定固定键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// 字段定义
///
/// - 基础字段：`kind` 为标量种类（切片时为元素种类）
/// - 数据类型字段：`kind` 为 `Struct`，`data_type` 为数据类型键
/// - 实体字段：`kind` 为 `Struct`，`entity_key` 指向另一个已登记的实体
///
/// `is_pointer` 表示元素可空，`is_slice` 表示元素的切片
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// 字段名
    pub name: String,
    /// 字段种类
    pub kind: Kind,
    /// 原始标签文本，原样传递
    #[serde(default)]
    pub tag: String,
    /// 嵌套实体键
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_key: Option<EntityKey>,
    /// 数据类型键
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataTypeKey>,
    #[serde(default)]
    pub is_slice: bool,
    #[serde(default)]
    pub is_pointer: bool,
}

impl FieldDefinition {
    /// 基础字段
    pub fn primitive(name: impl Into<String>, kind: Kind, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            tag: tag.into(),
            entity_key: None,
            data_type: None,
            is_slice: false,
            is_pointer: false,
        }
    }

    /// 数据类型字段
    pub fn data_type(name: impl Into<String>, key: DataTypeKey, tag: impl Into<String>) -> Self {
        Self {
            data_type: Some(key),
            ..Self::primitive(name, Kind::Struct, tag)
        }
    }

    /// 嵌套实体字段
    pub fn entity(name: impl Into<String>, key: EntityKey, tag: impl Into<String>) -> Self {
        Self {
            entity_key: Some(key),
            ..Self::primitive(name, Kind::Struct, tag)
        }
    }

    /// 设置为切片
    pub fn slice(mut self) -> Self {
        self.is_slice = true;
        self
    }

    /// 设置为可空
    pub fn pointer(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    pub(crate) fn with_flags(mut self, is_slice: bool, is_pointer: bool) -> Self {
        self.is_slice = is_slice;
        self.is_pointer = is_pointer;
        self
    }

    pub fn is_entity(&self) -> bool {
        self.entity_key.is_some()
    }

    pub fn is_data_type(&self) -> bool {
        self.data_type.is_some()
    }
}
