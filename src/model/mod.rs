//! 实体定义系统模块
//!
//! 通过结构体定义实体，提取为可跨进程传递的字段定义序列

pub mod extractor;
pub mod field_definition;
pub mod macros;
pub mod reflect;
pub mod tag;
pub mod traits;

// 重新导出核心类型
pub use extractor::EntityExtractor;
pub use field_definition::{EntityKey, FieldDefinition};
pub use reflect::{classify, Classified, EntityRef, FieldShape, Reflect, TypeClass, TypeShape};
pub use tag::StructTag;
pub use traits::Entity;
