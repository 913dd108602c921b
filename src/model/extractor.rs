//! 实体提取器
//!
//! 将实体形状转换为字段定义序列并登记到 [`SchemaRegistry`]。嵌套实体先于外层登记，
//! 一次调用中途失败时不会提交任何条目

use crate::config::ShimConfig;
use crate::debug_log;
use crate::error::ShimResult;
use crate::model::field_definition::{EntityKey, FieldDefinition};
use crate::model::reflect::{classify, EntityRef, Reflect, TypeClass, TypeShape};
use crate::model::tag::StructTag;
use crate::registry::SchemaRegistry;
use rat_logger::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// 单次登记调用的提取状态
pub struct EntityExtractor<'a> {
    registry: &'a SchemaRegistry,
    config: &'a ShimConfig,
    staged: HashMap<EntityKey, Vec<FieldDefinition>>,
    staged_order: Vec<EntityKey>,
    in_progress: Vec<EntityKey>,
}

impl<'a> EntityExtractor<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            config: registry.config(),
            staged: HashMap::new(),
            staged_order: Vec::new(),
            in_progress: Vec::new(),
        }
    }

    /// 提取实体（含全部嵌套实体），结果暂存在提取器中
    pub fn extract(&mut self, entity: &EntityRef) -> ShimResult<EntityKey> {
        let key = entity.key();
        if self.registry.contains(key.as_str()) || self.staged.contains_key(&key) {
            return Ok(key);
        }
        if self.in_progress.contains(&key) {
            return Err(crate::shim_error!(
                unsupported,
                key,
                format!("递归引用尚在提取中的实体 {}", entity.type_name())
            ));
        }
        if self.in_progress.len() >= self.config.max_nesting_depth {
            return Err(crate::shim_error!(
                unsupported,
                key,
                format!("嵌套深度超过 {}", self.config.max_nesting_depth)
            ));
        }

        self.in_progress.push(key.clone());
        let result = self.extract_fields(entity);
        self.in_progress.pop();

        let fields = result?;
        debug!("提取实体 {}: {} 个字段", key, fields.len());
        self.staged_order.push(key.clone());
        self.staged.insert(key.clone(), fields);
        Ok(key)
    }

    fn extract_fields(&mut self, entity: &EntityRef) -> ShimResult<Vec<FieldDefinition>> {
        if let Some(option) = entity.attributes().iter().find_map(|a| wire_altering_option(a)) {
            return Err(crate::shim_error!(
                invalid_entity,
                format!("实体 {} 使用了 serde({})，字段名与结构无法还原", entity.type_name(), option)
            ));
        }

        let mut definitions = Vec::new();
        for field in entity.fields() {
            if let Some(option) = field.attributes.iter().find_map(|a| wire_altering_option(a)) {
                return Err(crate::shim_error!(
                    invalid_entity,
                    format!(
                        "字段 {}.{} 使用了 serde({})，请改用 `as \"...\"` 指定字段名",
                        entity.type_name(),
                        field.name,
                        option
                    )
                ));
            }
            if StructTag::new(&field.tag).is_ignored(&self.config.ignore_tag_keys) {
                debug_log!("忽略字段 {}.{}", entity.type_name(), field.name);
                continue;
            }

            let classified = classify(&field.shape, &field.name)?;
            let definition = match classified.class {
                TypeClass::Primitive(kind) => FieldDefinition::primitive(&field.name, kind, &field.tag),
                TypeClass::DataType(key) => FieldDefinition::data_type(&field.name, key, &field.tag),
                TypeClass::Entity(nested) => {
                    let nested_key = self.extract(&nested)?;
                    FieldDefinition::entity(&field.name, nested_key, &field.tag)
                }
            };
            definitions.push(definition.with_flags(classified.is_slice, classified.is_pointer));
        }
        Ok(definitions)
    }

    /// 将暂存结果按登记顺序提交到注册表
    pub fn commit(self) {
        let mut staged = self.staged;
        for key in self.staged_order {
            if let Some(fields) = staged.remove(&key) {
                self.registry.entries().insert(key, fields);
            }
        }
    }
}

impl SchemaRegistry {
    /// 登记实体类型
    ///
    /// `T` 必须是实体或实体的 `Option` 包装，返回实体键及其字段定义序列
    pub fn register_entity<T: Reflect>(&self) -> ShimResult<(EntityKey, Arc<Vec<FieldDefinition>>)> {
        self.register_shape(&T::shape())
    }

    /// 按值的类型登记实体
    pub fn register_value<T: Reflect>(&self, _value: &T) -> ShimResult<(EntityKey, Arc<Vec<FieldDefinition>>)> {
        self.register_entity::<T>()
    }

    /// 按形状登记实体
    pub fn register_shape(&self, shape: &TypeShape) -> ShimResult<(EntityKey, Arc<Vec<FieldDefinition>>)> {
        let entity = match shape {
            TypeShape::Entity(entity) => *entity,
            TypeShape::Pointer(inner) => match inner.as_ref() {
                TypeShape::Entity(entity) => *entity,
                other => return Err(not_an_entity(other)),
            },
            other => return Err(not_an_entity(other)),
        };

        let key = entity.key();
        if let Some(fields) = self.get(key.as_str()) {
            return Ok((key, fields));
        }

        let _guard = self.entries().write_lock();
        if let Some(fields) = self.get(key.as_str()) {
            return Ok((key, fields));
        }

        let mut extractor = EntityExtractor::new(self);
        if let Err(e) = extractor.extract(&entity) {
            warn!("登记实体 {} 失败: {}", key, e);
            return Err(e);
        }
        extractor.commit();

        let fields = self.get(key.as_str()).ok_or_else(|| {
            crate::shim_error!(unresolved, format!("实体 {} 提交后不可见", key))
        })?;
        debug!("登记实体完成: {}，注册表共 {} 个实体", key, self.len());
        Ok((key, fields))
    }
}

/// 会改变序列化字段名或结构的 serde 选项
const WIRE_ALTERING_OPTIONS: &[&str] = &[
    "rename",
    "rename_all",
    "rename_all_fields",
    "skip",
    "skip_serializing",
    "skip_deserializing",
    "flatten",
    "transparent",
    "with",
    "serialize_with",
    "deserialize_with",
    "into",
    "from",
    "try_from",
    "remote",
];

/// 在 `serde(...)` 属性文本中查找改变序列化形式的选项
fn wire_altering_option(attribute: &str) -> Option<&str> {
    let inner = attribute
        .trim()
        .strip_prefix("serde")?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    inner
        .split(',')
        .filter_map(|item| item.split(['=', '(']).next())
        .map(str::trim)
        .find(|name| WIRE_ALTERING_OPTIONS.contains(name))
}

fn not_an_entity(shape: &TypeShape) -> crate::error::ShimError {
    crate::shim_error!(invalid_entity, format!("{} 不是实体类型", shape.describe()))
}
