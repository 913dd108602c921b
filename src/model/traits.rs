//! Entity trait 定义模块
//!
//! 定义实体类型的核心接口

use crate::model::field_definition::EntityKey;
use crate::model::reflect::FieldShape;

/// 实体特征
///
/// 所有可提取的实体都必须实现这个特征，通常由 [`define_entity!`](crate::define_entity) 生成
pub trait Entity: 'static {
    /// 实体键，默认为完全限定类型名
    fn entity_key() -> EntityKey {
        EntityKey::of::<Self>()
    }

    /// 按声明顺序列出字段形状
    fn entity_fields() -> Vec<FieldShape>;

    /// 实体本身的属性文本
    fn entity_attributes() -> Vec<String> {
        Vec::new()
    }
}
