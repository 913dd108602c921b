//! 动态类型模块
//!
//! 在没有编译期类型信息的一端，由字段定义重建行为一致的运行期类型和值

pub mod builder;
pub mod dynamic_struct;
pub mod instance;
pub mod serde_impl;

pub use builder::Builder;
pub use dynamic_struct::{DynamicField, DynamicStruct, FieldType};
pub use instance::{DynamicInstance, FieldValue};
pub use serde_impl::InstanceSeed;
