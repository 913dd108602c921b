//! rat_shim - 跨进程实体结构垫片
//!
//! 在运行期提取实体类型的结构，传递到没有编译期类型信息的一端重建行为一致的动态类型，
//! 并以自描述的字节格式传递查询条件参数

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

// 导出所有公共模块
pub mod error;
pub mod types;
pub mod model;
pub mod registry;
pub mod dynamic;
pub mod codec;
pub mod search;
pub mod config;

// 重新导出常用类型和函数
pub use error::{ShimError, ShimResult};
pub use types::*;
pub use model::{Entity, EntityKey, FieldDefinition, Reflect, StructTag, TypeShape};
pub use registry::{Registry, SchemaRegistry, TypeRegistry};
pub use dynamic::{Builder, DynamicField, DynamicInstance, DynamicStruct, FieldType, FieldValue};
pub use codec::{
    ConditionValueCodec, EncodedArgument, Value, DATA_TYPE_FLAG, NO_SLICE_TYPE_FLAG,
    PRIMITIVE_FLAG, SLICE_TYPE_FLAG,
};
pub use search::{decode_search_values, Condition, EncodedCondition, Search, SearchPayload};
pub use config::{ShimConfig, ShimConfigBuilder};

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
