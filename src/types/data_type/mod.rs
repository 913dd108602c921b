//! 数据类型（需要精确类型重建的复合值）
//!
//! 时间戳、可空标量包装等类型不能按结构拆解，否则其序列化行为会发生变化。
//! 这些类型以一字节的键登记在 [`DataTypeRegistry`] 中，实体提取、动态类型
//! 构建和查询参数编解码都通过该注册表找到原始的具体类型。

mod builtin;

pub use builtin::Nullable;
pub use builtin::{NullBool, NullFloat64, NullInt64, NullString, NullTime};

use crate::error::{ShimError, ShimResult};
use once_cell::sync::Lazy;
use rat_logger::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 数据类型键，编码时占一个字节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTypeKey(pub u8);

impl DataTypeKey {
    /// `DateTime<Utc>`
    pub const TIMESTAMP: DataTypeKey = DataTypeKey(1);
    pub const NULL_INT64: DataTypeKey = DataTypeKey(2);
    pub const NULL_FLOAT64: DataTypeKey = DataTypeKey(3);
    pub const NULL_STRING: DataTypeKey = DataTypeKey(4);
    pub const NULL_BOOL: DataTypeKey = DataTypeKey(5);
    pub const NULL_TIME: DataTypeKey = DataTypeKey(6);
    pub const UUID: DataTypeKey = DataTypeKey(7);
}

impl fmt::Display for DataTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "datatype#{}", self.0)
    }
}

/// 可登记的数据类型
///
/// 实现者的 serde 表示就是该类型在外层编解码中的表示，重建端必须使用同一个类型
pub trait DataType:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Default + Send + Sync + 'static
{
    /// 唯一键
    const KEY: DataTypeKey;
    /// 类型名称，用于日志和调试输出
    const NAME: &'static str;
}

/// 类型擦除后的数据类型值
pub trait DataTypeValue: fmt::Debug + Send + Sync + 'static {
    fn data_type_key(&self) -> DataTypeKey;

    fn data_type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn clone_value(&self) -> Box<dyn DataTypeValue>;

    fn eq_value(&self, other: &dyn DataTypeValue) -> bool;

    /// 转换为 JSON 值，结果与原始类型直接序列化一致
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    /// 原生二进制负载
    fn to_payload(&self) -> bincode::Result<Vec<u8>>;
}

/// 装箱的数据类型值
pub type DataTypeValueBox = Box<dyn DataTypeValue>;

impl<T: DataType> DataTypeValue for T {
    fn data_type_key(&self) -> DataTypeKey {
        T::KEY
    }

    fn data_type_name(&self) -> &'static str {
        T::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn DataTypeValue> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn DataTypeValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn to_payload(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }
}

impl dyn DataTypeValue {
    /// 还原为具体类型
    pub fn downcast_ref<T: DataType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// 具体类型标识
    pub fn value_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }
}

impl Clone for Box<dyn DataTypeValue> {
    fn clone(&self) -> Self {
        self.clone_value()
    }
}

impl PartialEq for dyn DataTypeValue {
    fn eq(&self, other: &Self) -> bool {
        self.eq_value(other)
    }
}

/// 数据类型处理器
///
/// 负责按键创建零值以及从外层格式和二进制负载中还原具体类型
pub trait DataTypeHandler: Send + Sync {
    fn key(&self) -> DataTypeKey;

    fn name(&self) -> &'static str;

    /// 处理的具体类型
    fn value_type_id(&self) -> TypeId;

    fn zero(&self) -> DataTypeValueBox;

    fn from_json(&self, value: serde_json::Value) -> serde_json::Result<DataTypeValueBox>;

    fn decode(&self, payload: &[u8]) -> bincode::Result<DataTypeValueBox>;

    fn encode_slice(&self, items: &[DataTypeValueBox]) -> ShimResult<Vec<u8>>;

    fn decode_slice(&self, payload: &[u8]) -> bincode::Result<Vec<DataTypeValueBox>>;
}

impl fmt::Debug for dyn DataTypeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.key())
    }
}

/// 基于具体类型 serde 实现的处理器
struct NativeHandler<T>(PhantomData<fn() -> T>);

impl<T: DataType> DataTypeHandler for NativeHandler<T> {
    fn key(&self) -> DataTypeKey {
        T::KEY
    }

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn zero(&self) -> DataTypeValueBox {
        Box::new(T::default())
    }

    fn from_json(&self, value: serde_json::Value) -> serde_json::Result<DataTypeValueBox> {
        let value: T = serde_json::from_value(value)?;
        Ok(Box::new(value))
    }

    fn decode(&self, payload: &[u8]) -> bincode::Result<DataTypeValueBox> {
        let value: T = bincode::deserialize(payload)?;
        Ok(Box::new(value))
    }

    fn encode_slice(&self, items: &[DataTypeValueBox]) -> ShimResult<Vec<u8>> {
        let mut typed: Vec<&T> = Vec::with_capacity(items.len());
        for item in items {
            let value = item.downcast_ref::<T>().ok_or_else(|| ShimError::UnencodableValueError {
                message: format!(
                    "切片元素类型 {} 与切片声明的数据类型 {} 不一致",
                    item.data_type_name(),
                    T::NAME
                ),
            })?;
            typed.push(value);
        }
        Ok(bincode::serialize(&typed)?)
    }

    fn decode_slice(&self, payload: &[u8]) -> bincode::Result<Vec<DataTypeValueBox>> {
        let values: Vec<T> = bincode::deserialize(payload)?;
        Ok(values
            .into_iter()
            .map(|v| Box::new(v) as DataTypeValueBox)
            .collect())
    }
}

/// 数据类型注册表
///
/// 构建完成后以 `Arc` 共享，只读
#[derive(Default)]
pub struct DataTypeRegistry {
    handlers: HashMap<DataTypeKey, Arc<dyn DataTypeHandler>>,
}

impl DataTypeRegistry {
    /// 创建空注册表
    pub fn empty() -> Self {
        Self::default()
    }

    /// 创建包含内置数据类型的注册表
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        builtin::register_builtin(&mut registry);
        registry
    }

    /// 登记数据类型
    ///
    /// 同一个类型重复登记是幂等的；不同类型占用同一个键时返回配置错误
    pub fn register<T: DataType>(&mut self) -> ShimResult<()> {
        if let Some(existing) = self.handlers.get(&T::KEY) {
            if existing.value_type_id() == TypeId::of::<T>() {
                return Ok(());
            }
            return Err(crate::shim_error!(
                config,
                format!("数据类型键 {} 已被 {} 占用，无法登记 {}", T::KEY, existing.name(), T::NAME)
            ));
        }
        debug!("登记数据类型: {} -> {}", T::KEY, T::NAME);
        self.handlers
            .insert(T::KEY, Arc::new(NativeHandler::<T>(PhantomData)));
        Ok(())
    }

    /// 链式登记
    pub fn with<T: DataType>(mut self) -> ShimResult<Self> {
        self.register::<T>()?;
        Ok(self)
    }

    pub fn get(&self, key: DataTypeKey) -> Option<&Arc<dyn DataTypeHandler>> {
        self.handlers.get(&key)
    }

    pub fn contains(&self, key: DataTypeKey) -> bool {
        self.handlers.contains_key(&key)
    }

    /// 已登记的键，按键值排序
    pub fn keys(&self) -> Vec<DataTypeKey> {
        let mut keys: Vec<DataTypeKey> = self.handlers.keys().copied().collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for DataTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTypeRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

static BUILTIN_DATA_TYPES: Lazy<Arc<DataTypeRegistry>> =
    Lazy::new(|| Arc::new(DataTypeRegistry::builtin()));

/// 共享的内置数据类型注册表
pub fn builtin_data_types() -> Arc<DataTypeRegistry> {
    BUILTIN_DATA_TYPES.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Money {
        cents: i64,
        currency: String,
    }

    impl DataType for Money {
        const KEY: DataTypeKey = DataTypeKey(200);
        const NAME: &'static str = "money";
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct FakeTimestamp(i64);

    impl DataType for FakeTimestamp {
        const KEY: DataTypeKey = DataTypeKey::TIMESTAMP;
        const NAME: &'static str = "fake_timestamp";
    }

    #[test]
    fn test_builtin_registry_contents() {
        let registry = DataTypeRegistry::builtin();
        assert_eq!(registry.keys().len(), 7);
        let handler = registry.get(DataTypeKey::TIMESTAMP).unwrap();
        assert_eq!(handler.value_type_id(), TypeId::of::<DateTime<Utc>>());
        assert!(registry.contains(DataTypeKey::UUID));
    }

    #[test]
    fn test_key_collision_is_config_error() {
        let mut registry = DataTypeRegistry::builtin();
        assert!(registry.register::<DateTime<Utc>>().is_ok());
        let err = registry.register::<FakeTimestamp>().unwrap_err();
        assert!(matches!(err, ShimError::ConfigError { .. }));
    }

    #[test]
    fn test_custom_data_type_round_trip() {
        let registry = DataTypeRegistry::builtin().with::<Money>().unwrap();
        let handler = registry.get(Money::KEY).unwrap();

        let money = Money { cents: 1250, currency: "CNY".to_string() };
        let payload = DataTypeValue::to_payload(&money).unwrap();
        let decoded = handler.decode(&payload).unwrap();
        assert_eq!(decoded.downcast_ref::<Money>(), Some(&money));

        let json = DataTypeValue::to_json(&money).unwrap();
        let from_json = handler.from_json(json).unwrap();
        assert!(from_json.eq_value(&money));
        assert_eq!(handler.zero().downcast_ref::<Money>(), Some(&Money::default()));
    }
}
