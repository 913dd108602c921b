//! 动态结构类型
//!
//! 运行期构建的结构类型，字段有序且不可变，通过 `Arc` 共享

use crate::dynamic::instance::{DynamicInstance, FieldValue};
use crate::error::ShimResult;
use crate::model::tag::StructTag;
use crate::types::{DataType, DataTypeHandler, Kind, Primitive};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 动态字段类型
#[derive(Clone)]
pub enum FieldType {
    /// 基础标量
    Primitive(Kind),
    /// 已登记的数据类型
    DataType(Arc<dyn DataTypeHandler>),
    /// 嵌套动态类型
    Entity(Arc<DynamicStruct>),
    /// 可空元素
    Nullable(Box<FieldType>),
    /// 切片
    Slice(Box<FieldType>),
}

impl FieldType {
    pub fn nullable(inner: FieldType) -> Self {
        FieldType::Nullable(Box::new(inner))
    }

    pub fn slice(inner: FieldType) -> Self {
        FieldType::Slice(Box::new(inner))
    }

    /// 可读的类型名称
    pub fn type_name(&self) -> String {
        match self {
            FieldType::Primitive(kind) => kind.name().to_string(),
            FieldType::DataType(handler) => handler.name().to_string(),
            FieldType::Entity(ty) => format!("struct({} fields)", ty.num_field()),
            FieldType::Nullable(inner) => format!("Option<{}>", inner.type_name()),
            FieldType::Slice(inner) => format!("Vec<{}>", inner.type_name()),
        }
    }

    /// 是否恰好为指定的数据类型
    pub fn is_data_type<T: DataType>(&self) -> bool {
        matches!(self, FieldType::DataType(handler) if handler.value_type_id() == TypeId::of::<T>())
    }

    /// 零值：可空为 `Null`，切片为空，嵌套类型为零值实例
    pub fn zero_value(&self) -> FieldValue {
        match self {
            FieldType::Primitive(kind) => Primitive::zero(*kind)
                .map(FieldValue::Primitive)
                .unwrap_or(FieldValue::Null),
            FieldType::DataType(handler) => FieldValue::DataType(handler.zero()),
            FieldType::Entity(ty) => FieldValue::Entity(ty.new_instance()),
            FieldType::Nullable(_) => FieldValue::Null,
            FieldType::Slice(_) => FieldValue::Slice(Vec::new()),
        }
    }

    /// 值是否可以赋给该类型的字段
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldType::Nullable(_), FieldValue::Null) => true,
            (FieldType::Nullable(inner), value) => inner.accepts(value),
            (FieldType::Primitive(kind), FieldValue::Primitive(p)) => p.kind() == *kind,
            (FieldType::DataType(handler), FieldValue::DataType(v)) => {
                v.value_type_id() == handler.value_type_id()
            }
            (FieldType::Entity(ty), FieldValue::Entity(instance)) => {
                Arc::ptr_eq(ty, instance.struct_type()) || **ty == **instance.struct_type()
            }
            (FieldType::Slice(inner), FieldValue::Slice(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            _ => false,
        }
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldType::Primitive(a), FieldType::Primitive(b)) => a == b,
            (FieldType::DataType(a), FieldType::DataType(b)) => {
                a.key() == b.key() && a.value_type_id() == b.value_type_id()
            }
            (FieldType::Entity(a), FieldType::Entity(b)) => Arc::ptr_eq(a, b) || a == b,
            (FieldType::Nullable(a), FieldType::Nullable(b)) => a == b,
            (FieldType::Slice(a), FieldType::Slice(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// 动态字段
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicField {
    pub name: String,
    pub field_type: FieldType,
    /// 原始标签文本
    pub tag: String,
}

impl DynamicField {
    pub fn new(name: impl Into<String>, field_type: FieldType, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            tag: tag.into(),
        }
    }

    /// 读取标签中指定键的值
    pub fn tag_value(&self, key: &str) -> Option<String> {
        StructTag::new(&self.tag).get(key)
    }
}

/// 动态结构类型
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicStruct {
    fields: Vec<DynamicField>,
    index: HashMap<String, usize>,
}

impl DynamicStruct {
    /// 由已校验的字段列表创建，字段名必须唯一
    pub(crate) fn from_fields(fields: Vec<DynamicField>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self { fields, index }
    }

    /// 字段数量
    pub fn num_field(&self) -> usize {
        self.fields.len()
    }

    /// 按声明顺序排列的全部字段
    pub fn struct_type(&self) -> &[DynamicField] {
        &self.fields
    }

    pub fn field(&self, i: usize) -> Option<&DynamicField> {
        self.fields.get(i)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&DynamicField> {
        self.field_index(name).map(|i| &self.fields[i])
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// 创建零值实例
    pub fn new_instance(self: &Arc<Self>) -> DynamicInstance {
        DynamicInstance::zero(Arc::clone(self))
    }

    /// 反序列化种子，可用于任意自描述格式
    pub fn seed(self: &Arc<Self>) -> crate::dynamic::serde_impl::InstanceSeed {
        crate::dynamic::serde_impl::InstanceSeed::new(Arc::clone(self))
    }

    /// 从 JSON 字节创建实例
    pub fn instance_from_json(self: &Arc<Self>, bytes: &[u8]) -> ShimResult<DynamicInstance> {
        let mut instance = self.new_instance();
        instance.populate_json(bytes)?;
        Ok(instance)
    }
}
