//! 基础类型定义
//!
//! 定义字段种类、基础标量值以及需要精确重建的数据类型

pub mod kind;
pub mod primitive;
pub mod data_type;

// 重新导出所有公共类型
pub use kind::{Kind, UnknownKind};
pub use primitive::{Primitive, PrimitiveType};
pub use data_type::{
    builtin_data_types, DataType, DataTypeHandler, DataTypeKey, DataTypeRegistry, DataTypeValue,
    DataTypeValueBox, NullBool, NullFloat64, NullInt64, NullString, NullTime, Nullable,
};
