//! 动态实例的 serde 实现
//!
//! 序列化输出字段名到值的映射，与原始类型的派生实现保持一致。
//! 反序列化通过种子携带类型信息，数据类型字段经由 JSON 值中转后交给登记的具体类型。
//! 因此数据类型字段只支持人类可读格式（JSON、TOML 等），
//! 非人类可读格式下的输出会与原始类型不同，此时直接报错

use crate::dynamic::dynamic_struct::{DynamicStruct, FieldType};
use crate::dynamic::instance::{DynamicInstance, FieldValue};
use crate::types::Primitive;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{Error as SerError, SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 带类型信息的字段值，用于序列化
struct TypedValue<'a> {
    ty: &'a FieldType,
    value: &'a FieldValue,
}

impl Serialize for TypedValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.ty, self.value) {
            (FieldType::Nullable(_), FieldValue::Null) => serializer.serialize_none(),
            (FieldType::Nullable(inner), value) => serializer.serialize_some(&TypedValue { ty: inner, value }),
            (FieldType::Slice(inner), FieldValue::Slice(items)) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&TypedValue { ty: inner, value: item })?;
                }
                seq.end()
            }
            (_, value) => value.serialize(serializer),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Primitive(p) => p.serialize(serializer),
            FieldValue::DataType(v) if !serializer.is_human_readable() => Err(<S::Error as SerError>::custom(format!(
                "数据类型 {} 只能写入人类可读格式",
                v.data_type_name()
            ))),
            FieldValue::DataType(v) => v
                .to_json()
                .map_err(<S::Error as SerError>::custom)?
                .serialize(serializer),
            FieldValue::Slice(items) => serializer.collect_seq(items),
            FieldValue::Entity(instance) => instance.serialize(serializer),
        }
    }
}

impl Serialize for DynamicInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.struct_type().struct_type();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (field, (_, value)) in fields.iter().zip(self.iter()) {
            map.serialize_entry(&field.name, &TypedValue { ty: &field.field_type, value })?;
        }
        map.end()
    }
}

/// 单个字段值的反序列化种子
struct FieldSeed<'a> {
    ty: &'a FieldType,
}

impl<'de> DeserializeSeed<'de> for FieldSeed<'_> {
    type Value = FieldValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<FieldValue, D::Error> {
        match self.ty {
            FieldType::Primitive(kind) => {
                Primitive::deserialize_kind(*kind, deserializer).map(FieldValue::Primitive)
            }
            FieldType::DataType(handler) if !deserializer.is_human_readable() => Err(de::Error::custom(
                format!("数据类型 {} 只能从人类可读格式读取", handler.name()),
            )),
            FieldType::DataType(handler) => {
                let json = serde_json::Value::deserialize(deserializer)?;
                handler
                    .from_json(json)
                    .map(FieldValue::DataType)
                    .map_err(|e| de::Error::custom(format!("{}: {}", handler.name(), e)))
            }
            FieldType::Entity(ty) => InstanceSeed::new(Arc::clone(ty))
                .deserialize(deserializer)
                .map(FieldValue::Entity),
            FieldType::Nullable(inner) => deserializer.deserialize_option(NullableVisitor { inner }),
            FieldType::Slice(inner) => deserializer.deserialize_any(SliceVisitor { inner }),
        }
    }
}

struct NullableVisitor<'a> {
    inner: &'a FieldType,
}

impl<'de> Visitor<'de> for NullableVisitor<'_> {
    type Value = FieldValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "可空的 {}", self.inner.type_name())
    }

    fn visit_none<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<FieldValue, D::Error> {
        FieldSeed { ty: self.inner }.deserialize(deserializer)
    }
}

/// 切片访问器，`null` 视为空切片
struct SliceVisitor<'a> {
    inner: &'a FieldType,
}

impl<'de> Visitor<'de> for SliceVisitor<'_> {
    type Value = FieldValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{} 的序列", self.inner.type_name())
    }

    fn visit_none<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Slice(Vec::new()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Slice(Vec::new()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FieldValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element_seed(FieldSeed { ty: self.inner })? {
            items.push(item);
        }
        Ok(FieldValue::Slice(items))
    }
}

/// 动态实例的反序列化种子
pub struct InstanceSeed {
    ty: Arc<DynamicStruct>,
}

impl InstanceSeed {
    pub fn new(ty: Arc<DynamicStruct>) -> Self {
        Self { ty }
    }
}

impl<'de> DeserializeSeed<'de> for InstanceSeed {
    type Value = DynamicInstance;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<DynamicInstance, D::Error> {
        let mut instance = self.ty.new_instance();
        instance.populate(deserializer)?;
        Ok(instance)
    }
}

/// 就地填充实例的映射访问器
struct PopulateVisitor<'a> {
    instance: &'a mut DynamicInstance,
}

impl<'de> Visitor<'de> for PopulateVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "包含 {} 个字段的结构", self.instance.struct_type().num_field())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let ty = Arc::clone(self.instance.struct_type());
        while let Some(key) = map.next_key::<String>()? {
            match ty.field_index(&key) {
                Some(i) => {
                    let field_type = &ty.struct_type()[i].field_type;
                    self.instance.values_mut()[i] = map.next_value_seed(FieldSeed { ty: field_type })?;
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

impl DynamicInstance {
    /// 从任意自描述格式就地填充实例
    pub fn populate<'de, D: Deserializer<'de>>(&mut self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(PopulateVisitor { instance: self })
    }
}
