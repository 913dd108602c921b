//! 实体相关的宏定义
//!
//! 提供便捷的宏来定义实体及其字段标签

/// 便捷宏：定义实体
///
/// 生成结构体本身（附带 serde 派生）以及 `Entity`、`Reflect` 实现。
/// 字段后的 `=> "..."` 为结构标签，原样保存在字段定义中。
/// `as "..."` 指定序列化字段名，同时写入 `#[serde(rename)]` 和字段定义；
/// 直接书写 `#[serde(rename)]`、`rename_all`、`skip`、`flatten` 等改变字段名或结构的属性时登记会失败
///
/// 未指定 `key` 时实体键取完全限定类型名，它不保证跨编译器版本稳定
///
/// ```ignore
/// define_entity! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Account {
///         pub id: u32 => r#"gorm:"primary_key""#,
///         pub user_name: String as "userName",
///         pub secret: String => r#"gorm:"-""#,
///     }
///     key = "shop.Account",
/// }
/// ```
#[macro_export]
macro_rules! define_entity {
    (@tag) => {
        ""
    };
    (@tag $tag:literal) => {
        $tag
    };
    (@name $field:ident) => {
        stringify!($field)
    };
    (@name $field:ident $wire:literal) => {
        $wire
    };
    (@key $name:ident) => {
        $crate::model::field_definition::EntityKey::of::<$name>()
    };
    (@key $name:ident $key:expr) => {
        $crate::model::field_definition::EntityKey::new($key)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident: $field_type:ty $(as $wire:literal)? $(=> $tag:literal)?
            ),* $(,)?
        }
        $(key = $key:expr $(,)?)?
    ) => {
        #[derive(serde::Serialize, serde::Deserialize)]
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $(#[serde(rename = $wire)])?
                $field_vis $field: $field_type,
            )*
        }

        impl $crate::model::traits::Entity for $name {
            fn entity_key() -> $crate::model::field_definition::EntityKey {
                $crate::define_entity!(@key $name $($key)?)
            }

            fn entity_fields() -> Vec<$crate::model::reflect::FieldShape> {
                vec![
                    $(
                        $crate::model::reflect::FieldShape::new(
                            $crate::define_entity!(@name $field $($wire)?),
                            $crate::define_entity!(@tag $($tag)?),
                            <$field_type as $crate::model::reflect::Reflect>::shape(),
                        )
                        .with_attributes(vec![$(stringify!($field_meta).to_string()),*]),
                    )*
                ]
            }

            fn entity_attributes() -> Vec<String> {
                vec![$(stringify!($meta).to_string()),*]
            }
        }

        impl $crate::model::reflect::Reflect for $name {
            fn shape() -> $crate::model::reflect::TypeShape {
                $crate::model::reflect::TypeShape::entity::<$name>()
            }
        }
    };
}
