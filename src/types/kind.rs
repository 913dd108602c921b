//! 字段种类定义
//!
//! 种类的数值在序列化后必须保持稳定，编码端与解码端依赖同一套编号

use serde::{Deserialize, Serialize};
use std::fmt;

/// 基础/结构种类
///
/// 编号与 Go reflect.Kind 保持一致，便于与其他语言实现的对端互通
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Kind {
    Bool = 1,
    Int = 2,
    Int8 = 3,
    Int16 = 4,
    Int32 = 5,
    Int64 = 6,
    Uint = 7,
    Uint8 = 8,
    Uint16 = 9,
    Uint32 = 10,
    Uint64 = 11,
    Float32 = 13,
    Float64 = 14,
    String = 24,
    /// 结构体：嵌套实体或数据类型
    Struct = 25,
}

impl Kind {
    /// 是否为基础标量种类
    pub fn is_primitive(self) -> bool {
        !matches!(self, Kind::Struct)
    }

    /// 种类名称
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint => "uint",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::String => "string",
            Kind::Struct => "struct",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Kind> for u8 {
    fn from(kind: Kind) -> Self {
        kind as u8
    }
}

/// 无法识别的种类编号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownKind(pub u64);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的种类编号: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl TryFrom<u64> for Kind {
    type Error = UnknownKind;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let kind = match value {
            1 => Kind::Bool,
            2 => Kind::Int,
            3 => Kind::Int8,
            4 => Kind::Int16,
            5 => Kind::Int32,
            6 => Kind::Int64,
            7 => Kind::Uint,
            8 => Kind::Uint8,
            9 => Kind::Uint16,
            10 => Kind::Uint32,
            11 => Kind::Uint64,
            13 => Kind::Float32,
            14 => Kind::Float64,
            24 => Kind::String,
            25 => Kind::Struct,
            other => return Err(UnknownKind(other)),
        };
        Ok(kind)
    }
}

impl TryFrom<u8> for Kind {
    type Error = UnknownKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Kind::try_from(u64::from(value))
    }
}
