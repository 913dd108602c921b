//! 动态类型构建器
//!
//! 由字段定义序列构建 [`DynamicStruct`]。嵌套实体从 [`TypeRegistry`] 解析，
//! 数据类型从 [`DataTypeRegistry`] 解析。构建不会修改任何注册表

use crate::dynamic::dynamic_struct::{DynamicField, DynamicStruct, FieldType};
use crate::error::{ShimError, ShimResult};
use crate::model::field_definition::FieldDefinition;
use crate::registry::TypeRegistry;
use crate::types::{builtin_data_types, DataTypeRegistry, Kind};
use rat_logger::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// 动态类型构建器
///
/// 添加字段时产生的第一个错误会保留到 [`Builder::build`] 时返回
#[derive(Debug)]
pub struct Builder {
    data_types: Arc<DataTypeRegistry>,
    fields: Vec<DynamicField>,
    error: Option<ShimError>,
}

impl Builder {
    /// 使用内置数据类型创建构建器
    pub fn new() -> Self {
        Self::with_data_types(builtin_data_types())
    }

    /// 使用指定的数据类型注册表创建构建器
    pub fn with_data_types(data_types: Arc<DataTypeRegistry>) -> Self {
        Self {
            data_types,
            fields: Vec::new(),
            error: None,
        }
    }

    /// 添加单个字段
    pub fn add_field(mut self, name: impl Into<String>, field_type: FieldType, tag: impl Into<String>) -> Self {
        if self.error.is_none() {
            self.fields.push(DynamicField::new(name, field_type, tag));
        }
        self
    }

    /// 按字段定义序列添加字段，嵌套实体从 `registry` 中解析
    pub fn add_entity_field_definition(mut self, definitions: &[FieldDefinition], registry: &TypeRegistry) -> Self {
        for definition in definitions {
            if self.error.is_some() {
                break;
            }
            match self.resolve(definition, registry) {
                Ok(field_type) => self.fields.push(DynamicField::new(
                    definition.name.clone(),
                    field_type,
                    definition.tag.clone(),
                )),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    fn resolve(&self, definition: &FieldDefinition, registry: &TypeRegistry) -> ShimResult<FieldType> {
        let element = if let Some(key) = &definition.entity_key {
            let ty = registry
                .get(key.as_str())
                .ok_or_else(|| crate::shim_error!(unresolved, format!("实体 {}（字段 {}）", key, definition.name)))?;
            FieldType::Entity(ty)
        } else if let Some(key) = definition.data_type {
            let handler = self
                .data_types
                .get(key)
                .ok_or_else(|| crate::shim_error!(unresolved, format!("数据类型 {}（字段 {}）", key, definition.name)))?;
            FieldType::DataType(Arc::clone(handler))
        } else if definition.kind == Kind::Struct {
            return Err(crate::shim_error!(unsupported, definition.name, "struct 字段缺少实体键或数据类型键"));
        } else {
            FieldType::Primitive(definition.kind)
        };

        let element = if definition.is_pointer {
            FieldType::nullable(element)
        } else {
            element
        };
        Ok(if definition.is_slice {
            FieldType::slice(element)
        } else {
            element
        })
    }

    /// 构建动态类型
    pub fn build(self) -> ShimResult<DynamicStruct> {
        if let Some(e) = self.error {
            warn!("构建动态类型失败: {}", e);
            return Err(e);
        }

        let mut names = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(crate::shim_error!(
                    invalid_entity,
                    format!("重复的字段名: {}", field.name)
                ));
            }
        }

        debug!("构建动态类型: {} 个字段", self.fields.len());
        Ok(DynamicStruct::from_fields(self.fields))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field_definition::EntityKey;
    use crate::types::{DataType, DataTypeKey};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl DataType for Point {
        const KEY: DataTypeKey = DataTypeKey(100);
        const NAME: &'static str = "point";
    }

    #[test]
    fn test_build_from_definitions() {
        let registry = TypeRegistry::new();
        let definitions = vec![
            FieldDefinition::primitive("id", Kind::Uint32, r#"gorm:"primary_key""#),
            FieldDefinition::data_type("deleted_at", DataTypeKey::TIMESTAMP, "").pointer(),
            FieldDefinition::primitive("attachment", Kind::Uint8, "").slice(),
        ];
        let ty = Builder::new()
            .add_entity_field_definition(&definitions, &registry)
            .build()
            .unwrap();

        assert_eq!(ty.num_field(), 3);
        assert_eq!(ty.field(0).unwrap().tag, r#"gorm:"primary_key""#);
        assert_eq!(ty.field(1).unwrap().field_type.type_name(), "Option<timestamp>");
        assert_eq!(ty.field(2).unwrap().field_type, FieldType::slice(FieldType::Primitive(Kind::Uint8)));
    }

    #[test]
    fn test_unresolved_references() {
        let registry = TypeRegistry::new();
        let entity = [FieldDefinition::entity("child", EntityKey::new("missing.Child"), "")];
        let err = Builder::new()
            .add_entity_field_definition(&entity, &registry)
            .build()
            .unwrap_err();
        assert!(matches!(err, ShimError::UnresolvedReferenceError { .. }));

        let custom = [FieldDefinition::data_type("at", Point::KEY, "")];
        let err = Builder::new()
            .add_entity_field_definition(&custom, &registry)
            .build()
            .unwrap_err();
        assert!(matches!(err, ShimError::UnresolvedReferenceError { .. }));

        let data_types = Arc::new(DataTypeRegistry::builtin().with::<Point>().unwrap());
        let ty = Builder::with_data_types(data_types)
            .add_entity_field_definition(&custom, &registry)
            .build()
            .unwrap();
        assert!(ty.field(0).unwrap().field_type.is_data_type::<Point>());
    }

    #[test]
    fn test_nested_entity_from_registry() {
        let registry = TypeRegistry::new();
        let child = Builder::new()
            .add_field("name", FieldType::Primitive(Kind::String), "")
            .build()
            .unwrap();
        let child = registry.insert(EntityKey::new("shop.Child"), child);

        let definitions = [FieldDefinition::entity("children", EntityKey::new("shop.Child"), "")
            .slice()
            .pointer()];
        let ty = Builder::new()
            .add_entity_field_definition(&definitions, &registry)
            .build()
            .unwrap();
        assert_eq!(
            ty.field(0).unwrap().field_type,
            FieldType::slice(FieldType::nullable(FieldType::Entity(child)))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_definitions() {
        let registry = TypeRegistry::new();
        let bare = [FieldDefinition::primitive("raw", Kind::Struct, "")];
        let err = Builder::new().add_entity_field_definition(&bare, &registry).build().unwrap_err();
        assert!(matches!(err, ShimError::UnsupportedKindError { .. }));

        let err = Builder::new()
            .add_field("a", FieldType::Primitive(Kind::Bool), "")
            .add_field("a", FieldType::Primitive(Kind::Bool), "")
            .build()
            .unwrap_err();
        assert!(matches!(err, ShimError::InvalidEntityError { .. }));
    }
}
