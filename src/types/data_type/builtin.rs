//! 内置数据类型

use super::{DataType, DataTypeKey, DataTypeRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 可空标量包装
///
/// `valid` 为 false 时 `value` 保持零值，与数据库驱动中的可空列语义一致
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Nullable<T> {
    pub value: T,
    pub valid: bool,
}

impl<T: Default> Nullable<T> {
    /// 有效值
    pub fn new(value: T) -> Self {
        Self { value, valid: true }
    }

    /// 空值
    pub fn null() -> Self {
        Self { value: T::default(), valid: false }
    }

    pub fn into_option(self) -> Option<T> {
        if self.valid { Some(self.value) } else { None }
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::new(v),
            None => Self::null(),
        }
    }
}

pub type NullInt64 = Nullable<i64>;
pub type NullFloat64 = Nullable<f64>;
pub type NullString = Nullable<String>;
pub type NullBool = Nullable<bool>;
pub type NullTime = Nullable<DateTime<Utc>>;

impl DataType for DateTime<Utc> {
    const KEY: DataTypeKey = DataTypeKey::TIMESTAMP;
    const NAME: &'static str = "timestamp";
}

impl DataType for NullInt64 {
    const KEY: DataTypeKey = DataTypeKey::NULL_INT64;
    const NAME: &'static str = "null_int64";
}

impl DataType for NullFloat64 {
    const KEY: DataTypeKey = DataTypeKey::NULL_FLOAT64;
    const NAME: &'static str = "null_float64";
}

impl DataType for NullString {
    const KEY: DataTypeKey = DataTypeKey::NULL_STRING;
    const NAME: &'static str = "null_string";
}

impl DataType for NullBool {
    const KEY: DataTypeKey = DataTypeKey::NULL_BOOL;
    const NAME: &'static str = "null_bool";
}

impl DataType for NullTime {
    const KEY: DataTypeKey = DataTypeKey::NULL_TIME;
    const NAME: &'static str = "null_time";
}

impl DataType for Uuid {
    const KEY: DataTypeKey = DataTypeKey::UUID;
    const NAME: &'static str = "uuid";
}

/// 登记全部内置数据类型
///
/// 内置类型的键互不冲突，登记不会失败
pub(super) fn register_builtin(registry: &mut DataTypeRegistry) {
    let results = [
        registry.register::<DateTime<Utc>>(),
        registry.register::<NullInt64>(),
        registry.register::<NullFloat64>(),
        registry.register::<NullString>(),
        registry.register::<NullBool>(),
        registry.register::<NullTime>(),
        registry.register::<Uuid>(),
    ];
    for result in results {
        if let Err(e) = result {
            rat_logger::warn!("内置数据类型登记失败: {}", e);
        }
    }
}
