//! 查询参数值
//!
//! 类型擦除后的查询条件参数，只允许可精确编码的类别

use crate::types::data_type::DataTypeValue;
use crate::types::{
    DataType, DataTypeKey, DataTypeValueBox, Kind, NullBool, NullFloat64, NullInt64, NullString,
    NullTime, Primitive, PrimitiveType,
};
use crate::types::primitive::primitive_table;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// 查询参数值
#[derive(Clone, PartialEq)]
pub enum Value {
    /// 单个基础值
    Primitive(Primitive),
    /// 同种类基础值的切片
    PrimitiveSlice(Kind, Vec<Primitive>),
    /// 单个数据类型值
    DataType(DataTypeValueBox),
    /// 同一数据类型的切片
    DataTypeSlice(DataTypeKey, Vec<DataTypeValueBox>),
}

impl Value {
    pub fn data_type<T: DataType>(value: T) -> Self {
        Value::DataType(Box::new(value))
    }

    /// 基础值切片，保留元素种类（空切片也能正确解码）
    pub fn slice<T: PrimitiveType>(items: Vec<T>) -> Self {
        Value::PrimitiveSlice(T::KIND, items.into_iter().map(Into::into).collect())
    }

    pub fn data_type_slice<T: DataType>(items: Vec<T>) -> Self {
        Value::DataTypeSlice(
            T::KEY,
            items
                .into_iter()
                .map(|v| Box::new(v) as DataTypeValueBox)
                .collect(),
        )
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, Value::PrimitiveSlice(..) | Value::DataTypeSlice(..))
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// 还原为具体的数据类型
    pub fn as_data_type<T: DataType>(&self) -> Option<&T> {
        match self {
            Value::DataType(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// 还原为具体数据类型的切片，任一元素类型不符时返回 `None`
    pub fn as_data_type_slice<T: DataType>(&self) -> Option<Vec<&T>> {
        match self {
            Value::DataTypeSlice(_, items) => items.iter().map(|v| v.downcast_ref::<T>()).collect(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Primitive(p) => write!(f, "{:?}", p),
            Value::PrimitiveSlice(kind, items) => write!(f, "[{}]{:?}", kind, items),
            Value::DataType(v) => write!(f, "{}({:?})", v.data_type_name(), v),
            Value::DataTypeSlice(key, items) => write!(f, "[{}]{:?}", key, items),
        }
    }
}

macro_rules! value_from_primitive {
    ($($variant:ident => $ty:ty,)*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Primitive(Primitive::$variant(v))
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(items: Vec<$ty>) -> Self {
                    Value::slice(items)
                }
            }
        )*
    };
}

primitive_table!(value_from_primitive);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Primitive(Primitive::from(v))
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::slice(items.into_iter().map(str::to_string).collect::<Vec<String>>())
    }
}

impl From<Primitive> for Value {
    fn from(v: Primitive) -> Self {
        Value::Primitive(v)
    }
}

macro_rules! value_from_data_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::data_type(v)
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(items: Vec<$ty>) -> Self {
                    Value::data_type_slice(items)
                }
            }
        )*
    };
}

value_from_data_type!(DateTime<Utc>, NullInt64, NullFloat64, NullString, NullBool, NullTime, Uuid);
