//! 类型形状与分类
//!
//! Rust 没有运行时反射，实体在编译期通过 [`Reflect`] 描述自身形状，
//! 提取器在运行期根据形状对字段进行分类

use crate::error::ShimResult;
use crate::model::field_definition::EntityKey;
use crate::model::traits::Entity;
use crate::types::primitive::primitive_table;
use crate::types::{DataType, DataTypeKey, Kind, NullBool, NullFloat64, NullInt64, NullString, NullTime};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

/// 类型形状
#[derive(Debug, Clone)]
pub enum TypeShape {
    /// 基础标量
    Primitive(Kind),
    /// 已识别的数据类型
    DataType(DataTypeKey),
    /// 嵌套实体
    Entity(EntityRef),
    /// 可空包装（`Option<T>`）
    Pointer(Box<TypeShape>),
    /// 切片（`Vec<T>`）
    Slice(Box<TypeShape>),
    /// 无法表示的类型，附带类型描述
    Unsupported(&'static str),
}

impl TypeShape {
    /// 数据类型的形状
    pub fn data_type<T: DataType>() -> Self {
        TypeShape::DataType(T::KEY)
    }

    /// 实体的形状
    pub fn entity<T: Entity>() -> Self {
        TypeShape::Entity(EntityRef::of::<T>())
    }

    pub fn describe(&self) -> String {
        match self {
            TypeShape::Primitive(kind) => kind.name().to_string(),
            TypeShape::DataType(key) => key.to_string(),
            TypeShape::Entity(entity) => entity.type_name().to_string(),
            TypeShape::Pointer(inner) => format!("Option<{}>", inner.describe()),
            TypeShape::Slice(inner) => format!("Vec<{}>", inner.describe()),
            TypeShape::Unsupported(name) => (*name).to_string(),
        }
    }
}

/// 单个字段的形状
#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: String,
    pub tag: String,
    pub shape: TypeShape,
    /// 字段上的属性文本，例如 `serde(default)`
    pub attributes: Vec<String>,
}

impl FieldShape {
    pub fn new(name: impl Into<String>, tag: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            shape,
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// 实体引用
///
/// 字段列表通过函数指针延迟获取，自引用类型的形状因此可以有限地构造
#[derive(Clone, Copy)]
pub struct EntityRef {
    key: fn() -> EntityKey,
    fields: fn() -> Vec<FieldShape>,
    attributes: fn() -> Vec<String>,
    type_name: &'static str,
}

impl EntityRef {
    pub fn of<T: Entity>() -> Self {
        Self {
            key: T::entity_key,
            fields: T::entity_fields,
            attributes: T::entity_attributes,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn key(&self) -> EntityKey {
        (self.key)()
    }

    pub fn fields(&self) -> Vec<FieldShape> {
        (self.fields)()
    }

    /// 实体本身的属性文本
    pub fn attributes(&self) -> Vec<String> {
        (self.attributes)()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self.type_name)
    }
}

/// 能够描述自身形状的类型
pub trait Reflect {
    fn shape() -> TypeShape;
}

macro_rules! reflect_primitive {
    ($($variant:ident => $ty:ty,)*) => {
        $(
            impl Reflect for $ty {
                fn shape() -> TypeShape {
                    TypeShape::Primitive(Kind::$variant)
                }
            }
        )*
    };
}

primitive_table!(reflect_primitive);

macro_rules! reflect_data_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn shape() -> TypeShape {
                    TypeShape::data_type::<$ty>()
                }
            }
        )*
    };
}

reflect_data_type!(DateTime<Utc>, NullInt64, NullFloat64, NullString, NullBool, NullTime, Uuid);

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::Pointer(Box::new(T::shape()))
    }
}

/// `Box<T>` 的序列化与 `T` 相同，形状透明
impl<T: Reflect> Reflect for Box<T> {
    fn shape() -> TypeShape {
        T::shape()
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::Slice(Box::new(T::shape()))
    }
}

impl<K, V> Reflect for HashMap<K, V> {
    fn shape() -> TypeShape {
        TypeShape::Unsupported("map")
    }
}

impl<K, V> Reflect for BTreeMap<K, V> {
    fn shape() -> TypeShape {
        TypeShape::Unsupported("map")
    }
}

impl Reflect for char {
    fn shape() -> TypeShape {
        TypeShape::Unsupported("char")
    }
}

impl Reflect for serde_json::Value {
    fn shape() -> TypeShape {
        TypeShape::Unsupported("interface")
    }
}

/// 分类结果中的叶子类别
#[derive(Debug, Clone, Copy)]
pub enum TypeClass {
    Primitive(Kind),
    DataType(DataTypeKey),
    Entity(EntityRef),
}

/// 分类结果
#[derive(Debug, Clone, Copy)]
pub struct Classified {
    pub class: TypeClass,
    pub is_slice: bool,
    pub is_pointer: bool,
}

/// 对字段形状分类
///
/// 支持：`T`、`Option<T>`、`Vec<T>`、`Vec<Option<T>>`，其中 `T` 为基础标量、数据类型或实体。
/// 其余组合返回 `UnsupportedKindError`
pub fn classify(shape: &TypeShape, field: &str) -> ShimResult<Classified> {
    let unsupported = |kind: String| crate::shim_error!(unsupported, field, kind);

    let (element, is_slice) = match shape {
        TypeShape::Slice(inner) => (inner.as_ref(), true),
        TypeShape::Pointer(inner) if matches!(inner.as_ref(), TypeShape::Slice(_)) => {
            return Err(unsupported(format!("可空切片 {}", shape.describe())));
        }
        other => (other, false),
    };

    let (leaf, is_pointer) = match element {
        TypeShape::Pointer(inner) => (inner.as_ref(), true),
        other => (other, false),
    };

    let class = match leaf {
        TypeShape::Primitive(kind) if kind.is_primitive() => TypeClass::Primitive(*kind),
        TypeShape::DataType(key) => TypeClass::DataType(*key),
        TypeShape::Entity(entity) => TypeClass::Entity(*entity),
        TypeShape::Pointer(_) | TypeShape::Slice(_) => {
            return Err(unsupported(format!("多层嵌套 {}", shape.describe())));
        }
        other => return Err(unsupported(other.describe())),
    };

    Ok(Classified {
        class,
        is_slice,
        is_pointer,
    })
}
