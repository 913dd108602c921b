//! 基础标量值
//!
//! 每个基础种类对应一个固定的 Rust 原生类型，序列化时直接使用原生类型的 serde 表示

use crate::error::ShimResult;
use crate::types::kind::Kind;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 基础种类与原生类型的对照表
///
/// 以回调宏的形式展开，保证各处的种类分派保持一致
macro_rules! primitive_table {
    ($callback:ident) => {
        $callback! {
            Bool => bool,
            Int => isize,
            Int8 => i8,
            Int16 => i16,
            Int32 => i32,
            Int64 => i64,
            Uint => usize,
            Uint8 => u8,
            Uint16 => u16,
            Uint32 => u32,
            Uint64 => u64,
            Float32 => f32,
            Float64 => f64,
            String => String,
        }
    };
}

pub(crate) use primitive_table;

/// 可作为基础值使用的原生类型
pub trait PrimitiveType: Serialize + DeserializeOwned + Into<Primitive> + Clone + 'static {
    /// 对应的种类
    const KIND: Kind;
}

macro_rules! define_primitive {
    ($($variant:ident => $ty:ty,)*) => {
        /// 基础标量值
        #[derive(Debug, Clone, PartialEq)]
        pub enum Primitive {
            $($variant($ty),)*
        }

        impl Primitive {
            /// 获取值的种类
            pub fn kind(&self) -> Kind {
                match self {
                    $(Primitive::$variant(_) => Kind::$variant,)*
                }
            }

            /// 指定种类的零值，结构种类没有零值
            pub fn zero(kind: Kind) -> Option<Self> {
                match kind {
                    $(Kind::$variant => Some(Primitive::$variant(<$ty>::default())),)*
                    Kind::Struct => None,
                }
            }

            /// 按种类从任意自描述格式中反序列化
            pub fn deserialize_kind<'de, D>(kind: Kind, deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                match kind {
                    $(Kind::$variant => <$ty as Deserialize<'de>>::deserialize(deserializer).map(Primitive::$variant),)*
                    Kind::Struct => Err(D::Error::custom("struct 不是基础种类")),
                }
            }

            /// 从 bincode 负载解码单个值
            pub(crate) fn decode_payload(kind: Kind, payload: &[u8]) -> ShimResult<Self> {
                match kind {
                    $(Kind::$variant => Ok(Primitive::$variant(bincode::deserialize::<$ty>(payload)?)),)*
                    Kind::Struct => Err(crate::shim_error!(unknown_encoding, "struct 不是基础种类")),
                }
            }

            /// 从 bincode 负载解码同种类的切片
            pub(crate) fn decode_slice_payload(kind: Kind, payload: &[u8]) -> ShimResult<Vec<Self>> {
                match kind {
                    $(Kind::$variant => Ok(bincode::deserialize::<Vec<$ty>>(payload)?
                        .into_iter()
                        .map(Primitive::$variant)
                        .collect()),)*
                    Kind::Struct => Err(crate::shim_error!(unknown_encoding, "struct 不是基础种类")),
                }
            }
        }

        impl Serialize for Primitive {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $(Primitive::$variant(v) => v.serialize(serializer),)*
                }
            }
        }

        $(
            impl From<$ty> for Primitive {
                fn from(v: $ty) -> Self {
                    Primitive::$variant(v)
                }
            }

            impl PrimitiveType for $ty {
                const KIND: Kind = Kind::$variant;
            }
        )*
    };
}

primitive_table!(define_primitive);

impl From<&str> for Primitive {
    fn from(v: &str) -> Self {
        Primitive::String(v.to_string())
    }
}

impl Primitive {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Primitive::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 任意有符号整数种类转换为 i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Primitive::Int(v) => Some(*v as i64),
            Primitive::Int8(v) => Some(i64::from(*v)),
            Primitive::Int16(v) => Some(i64::from(*v)),
            Primitive::Int32(v) => Some(i64::from(*v)),
            Primitive::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// 任意无符号整数种类转换为 u64
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Primitive::Uint(v) => Some(*v as u64),
            Primitive::Uint8(v) => Some(u64::from(*v)),
            Primitive::Uint16(v) => Some(u64::from(*v)),
            Primitive::Uint32(v) => Some(u64::from(*v)),
            Primitive::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Primitive::Float32(v) => Some(f64::from(*v)),
            Primitive::Float64(v) => Some(*v),
            _ => None,
        }
    }
}
