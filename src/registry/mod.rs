//! 注册表模块
//!
//! 以实体键为索引的只增不改注册表。提取端保存字段定义序列，重建端保存构建好的动态类型

use crate::config::ShimConfig;
use crate::dynamic::DynamicStruct;
use crate::model::field_definition::{EntityKey, FieldDefinition};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

/// 并发注册表
///
/// 条目插入一次后不再修改，读取无需加锁。"查找，否则计算并插入"的流程通过
/// [`Registry::write_lock`] 串行化
pub struct Registry<V> {
    entries: DashMap<EntityKey, Arc<V>>,
    write_lock: Mutex<()>,
}

impl<V> Registry<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 已登记的键，按字典序排序
    pub fn keys(&self) -> Vec<EntityKey> {
        let mut keys: Vec<EntityKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// 插入条目
    ///
    /// 键已存在时保留原条目并返回它
    pub fn insert(&self, key: EntityKey, value: V) -> Arc<V> {
        self.insert_arc(key, Arc::new(value))
    }

    pub fn insert_arc(&self, key: EntityKey, value: Arc<V>) -> Arc<V> {
        Arc::clone(self.entries.entry(key).or_insert(value).value())
    }

    /// 获取写锁
    pub(crate) fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock()
    }
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("keys", &self.keys()).finish()
    }
}

/// 重建端注册表：实体键 -> 动态类型
pub type TypeRegistry = Registry<DynamicStruct>;

/// 提取端注册表：实体键 -> 字段定义序列
///
/// 携带提取配置，登记方法见 [`crate::model::extractor`]
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: Registry<Vec<FieldDefinition>>,
    config: ShimConfig,
}

impl SchemaRegistry {
    /// 使用默认配置创建
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ShimConfig) -> Self {
        Self {
            entries: Registry::new(),
            config,
        }
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<FieldDefinition>>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<EntityKey> {
        self.entries.keys()
    }

    pub(crate) fn entries(&self) -> &Registry<Vec<FieldDefinition>> {
        &self.entries
    }
}
