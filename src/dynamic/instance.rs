//! 动态实例
//!
//! 动态结构类型的值容器，字段值与类型中的字段一一对应

use crate::dynamic::dynamic_struct::DynamicStruct;
use crate::error::ShimResult;
use crate::types::{DataType, DataTypeValueBox, Primitive};
use std::sync::Arc;

/// 字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 可空字段的空值
    Null,
    Primitive(Primitive),
    DataType(DataTypeValueBox),
    Slice(Vec<FieldValue>),
    Entity(DynamicInstance),
}

impl FieldValue {
    /// 包装数据类型值
    pub fn data_type<T: DataType>(value: T) -> Self {
        FieldValue::DataType(Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            FieldValue::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// 还原为具体的数据类型
    pub fn as_data_type<T: DataType>(&self) -> Option<&T> {
        match self {
            FieldValue::DataType(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Slice(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&DynamicInstance> {
        match self {
            FieldValue::Entity(instance) => Some(instance),
            _ => None,
        }
    }
}

impl From<Primitive> for FieldValue {
    fn from(value: Primitive) -> Self {
        FieldValue::Primitive(value)
    }
}

impl From<DynamicInstance> for FieldValue {
    fn from(value: DynamicInstance) -> Self {
        FieldValue::Entity(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::Slice(items)
    }
}

/// 动态实例
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicInstance {
    ty: Arc<DynamicStruct>,
    values: Vec<FieldValue>,
}

impl DynamicInstance {
    pub(crate) fn zero(ty: Arc<DynamicStruct>) -> Self {
        let values = ty
            .struct_type()
            .iter()
            .map(|f| f.field_type.zero_value())
            .collect();
        Self { ty, values }
    }

    /// 所属的动态类型
    pub fn struct_type(&self) -> &Arc<DynamicStruct> {
        &self.ty
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.ty.field_index(name).map(|i| &self.values[i])
    }

    pub fn field_at(&self, i: usize) -> Option<&FieldValue> {
        self.values.get(i)
    }

    pub(crate) fn values_mut(&mut self) -> &mut [FieldValue] {
        &mut self.values
    }

    /// 设置字段值，值的类型必须与字段类型一致
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> ShimResult<()> {
        let value = value.into();
        let i = self
            .ty
            .field_index(name)
            .ok_or_else(|| crate::shim_error!(unresolved, format!("字段 {}", name)))?;
        let field_type = &self.ty.struct_type()[i].field_type;
        if !field_type.accepts(&value) {
            return Err(crate::shim_error!(
                unsupported,
                name,
                format!("期望 {}，实际值 {:?}", field_type.type_name(), value)
            ));
        }
        self.values[i] = value;
        Ok(())
    }

    /// 按声明顺序遍历字段名与值
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.ty
            .struct_type()
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }

    /// 从 JSON 字节填充实例，缺失的字段保持原值，未知字段被忽略
    pub fn populate_json(&mut self, bytes: &[u8]) -> ShimResult<()> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        self.populate(&mut deserializer)?;
        deserializer.end()?;
        Ok(())
    }

    /// 转换为 JSON 值
    pub fn to_json(&self) -> ShimResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
