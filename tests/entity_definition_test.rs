use chrono::{DateTime, Utc};
use rat_shim::*;
use std::collections::HashMap;
use std::sync::{Arc, Once};
use std::thread;

static INIT: Once = Once::new();

fn init_logger() {
    INIT.call_once(|| {
        let _ = rat_logger::LoggerBuilder::new()
            .with_level(rat_logger::LevelFilter::Debug)
            .add_terminal_with_config(rat_logger::handler::term::TermConfig::default())
            .init();
    });
}

define_entity! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct TestSubModel {
        pub id: u32 => r#"gorm:"primary_key""#,
        pub created_at: DateTime<Utc> => r#"ormdb:"datatype""#,
        pub updated_at: DateTime<Utc> => r#"ormdb:"datatype""#,
        pub deleted_at: Option<DateTime<Utc>> => r#"sql:"index" ormdb:"datatype""#,
        pub name: String,
    }
}

define_entity! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct TestModel {
        pub name: String,
        pub age: NullInt64 => r#"ormdb:"datatype""#,
        pub birthday: Option<DateTime<Utc>> => r#"ormdb:"datatype""#,
        pub email: String => r#"gorm:"type:varchar(100);unique_index""#,
        pub role: String => r#"gorm:"size:255""#,
        pub member_number: Option<String> => r#"gorm:"unique;not null""#,
        pub num: i64 => r#"gorm:"AUTO_INCREMENT""#,
        pub address: String => r#"gorm:"index:addr""#,
        #[serde(default)]
        pub ignore_me: i64 => r#"gorm:"-""#,
        pub test_sub_models: Vec<TestSubModel> => r#"ormdb:"entity""#,
        pub test_sub_models1: Vec<Option<TestSubModel>> => r#"ormdb:"entity""#,
        #[serde(default)]
        pub ignore_me1: Option<i64> => r#"gorm:"-""#,
        pub attachment: Vec<u8>,
    }
}

define_entity! {
    #[derive(Debug, Clone)]
    pub struct TreeNode {
        pub name: String,
        pub children: Vec<TreeNode>,
    }
}

define_entity! {
    #[derive(Debug, Clone)]
    pub struct WithMap {
        pub id: u32,
        pub props: HashMap<String, String>,
    }
}

define_entity! {
    #[derive(Debug, Clone)]
    pub struct Renamed {
        pub id: u32,
    }
    key = "shop.Renamed",
}

define_entity! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Account {
        pub id: u32 => r#"gorm:"primary_key""#,
        pub user_name: String as "userName" => r#"gorm:"size:64""#,
    }
}

define_entity! {
    #[derive(Debug, Clone)]
    pub struct RawRenamedAccount {
        pub id: u32,
        #[serde(rename = "userName")]
        pub user_name: String,
    }
}

fn sub_model(now: DateTime<Utc>) -> TestSubModel {
    TestSubModel {
        id: 1,
        created_at: now,
        updated_at: now,
        deleted_at: None,
        name: "Test".to_string(),
    }
}

fn test_model(now: DateTime<Utc>) -> TestModel {
    TestModel {
        name: "Test".to_string(),
        age: NullInt64 { value: 1, valid: false },
        birthday: Some(now),
        email: "test@example.com".to_string(),
        role: "SS".to_string(),
        member_number: None,
        num: 42,
        address: "addr".to_string(),
        ignore_me: 0,
        test_sub_models: vec![sub_model(now)],
        test_sub_models1: vec![Some(sub_model(now)), None],
        ignore_me1: None,
        attachment: vec![1, 2, 3],
    }
}

/// 经过 JSON 往返的字段定义重建动态类型
fn rebuild_types(schemas: &SchemaRegistry) -> (TypeRegistry, Arc<DynamicStruct>, Arc<DynamicStruct>) {
    let (sub_key, sub_fields) = schemas.register_entity::<TestSubModel>().unwrap();
    let (key, fields) = schemas.register_entity::<TestModel>().unwrap();

    let sub_bytes = serde_json::to_vec(&*sub_fields).unwrap();
    let bytes = serde_json::to_vec(&*fields).unwrap();
    let sub_fields: Vec<FieldDefinition> = serde_json::from_slice(&sub_bytes).unwrap();
    let fields: Vec<FieldDefinition> = serde_json::from_slice(&bytes).unwrap();

    let types = TypeRegistry::new();
    let sub_ds = Builder::new()
        .add_entity_field_definition(&sub_fields, &types)
        .build()
        .unwrap();
    let sub_ds = types.insert(sub_key, sub_ds);
    let ds = Builder::new()
        .add_entity_field_definition(&fields, &types)
        .build()
        .unwrap();
    let ds = types.insert(key, ds);
    (types, sub_ds, ds)
}

#[test]
fn test_register_entity_and_field_definitions() {
    init_logger();
    println!("🔍 测试实体登记与字段定义");

    let schemas = SchemaRegistry::new();
    let (sub_key, sub_fields) = schemas.register_entity::<TestSubModel>().unwrap();
    assert_eq!(sub_key, EntityKey::of::<TestSubModel>());

    let id = sub_fields.iter().find(|f| f.name == "id").unwrap();
    assert_eq!(id.kind, Kind::Uint32);
    assert_eq!(id.tag, r#"gorm:"primary_key""#);

    let deleted_at = sub_fields.iter().find(|f| f.name == "deleted_at").unwrap();
    assert_eq!(deleted_at.kind, Kind::Struct);
    assert_eq!(deleted_at.data_type, Some(DataTypeKey::TIMESTAMP));
    assert!(deleted_at.is_pointer && !deleted_at.is_slice);

    let (_, fields) = schemas.register_entity::<TestModel>().unwrap();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "name", "age", "birthday", "email", "role", "member_number", "num", "address",
            "test_sub_models", "test_sub_models1", "attachment",
        ]
    );

    let email = &fields[3];
    assert_eq!(email.kind, Kind::String);
    assert_eq!(email.tag, r#"gorm:"type:varchar(100);unique_index""#);

    let subs = &fields[8];
    assert_eq!(subs.entity_key.as_ref(), Some(&sub_key));
    assert!(subs.is_slice && !subs.is_pointer);
    let subs1 = &fields[9];
    assert!(subs1.is_slice && subs1.is_pointer);

    let attachment = &fields[10];
    assert_eq!(attachment.kind, Kind::Uint8);
    assert!(attachment.is_slice);

    let json = serde_json::to_string(&*fields).unwrap();
    let decoded: Vec<FieldDefinition> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, *fields);
    println!("✅ 字段定义 JSON 往返一致: {} 个字段", decoded.len());
}

#[test]
fn test_dynamic_struct_from_definitions() {
    init_logger();
    let schemas = SchemaRegistry::new();
    let (types, sub_ds, ds) = rebuild_types(&schemas);
    assert_eq!(types.len(), 2);

    let (_, sub_fields) = schemas.register_entity::<TestSubModel>().unwrap();
    let (_, fields) = schemas.register_entity::<TestModel>().unwrap();
    for (definitions, built) in [(&sub_fields, &sub_ds), (&fields, &ds)] {
        assert_eq!(built.num_field(), definitions.len());
        for (field, definition) in built.struct_type().iter().zip(definitions.iter()) {
            assert_eq!(field.name, definition.name);
            assert_eq!(field.tag, definition.tag);
        }
    }

    assert_eq!(sub_ds.num_field(), 5);
    let id = sub_ds.field_by_name("id").unwrap();
    assert_eq!(id.tag, r#"gorm:"primary_key""#);
    assert_eq!(id.tag_value("gorm").as_deref(), Some("primary_key"));

    assert_eq!(ds.num_field(), 11);
    let age = ds.struct_type().iter().find(|f| f.name == "age").unwrap();
    assert!(age.field_type.is_data_type::<NullInt64>());
    assert_eq!(
        ds.field_by_name("test_sub_models1").unwrap().field_type,
        FieldType::slice(FieldType::nullable(FieldType::Entity(Arc::clone(&sub_ds))))
    );
    assert!(ds.field_by_name("ignore_me").is_none());
    assert!(ds.field_by_name("ignore_me1").is_none());
}

#[test]
fn test_populate_dynamic_instances() {
    init_logger();
    let schemas = SchemaRegistry::new();
    let (_, sub_ds, ds) = rebuild_types(&schemas);
    let now = Utc::now();

    let sub = sub_model(now);
    let sub_bytes = serde_json::to_vec(&sub).unwrap();
    let instance = sub_ds.instance_from_json(&sub_bytes).unwrap();
    assert_eq!(
        instance.field("name").and_then(|v| v.as_primitive()).and_then(Primitive::as_str),
        Some("Test")
    );
    assert_eq!(
        instance.field("created_at").and_then(|v| v.as_data_type::<DateTime<Utc>>()),
        Some(&now)
    );
    assert_eq!(
        instance.field("id").and_then(|v| v.as_primitive()).and_then(Primitive::as_u64),
        Some(1)
    );

    let model = test_model(now);
    let model_bytes = serde_json::to_vec(&model).unwrap();
    let mut instance = ds.new_instance();
    instance.populate_json(&model_bytes).unwrap();
    assert_eq!(
        instance.field("role").and_then(|v| v.as_primitive()).and_then(Primitive::as_str),
        Some("SS")
    );
    assert_eq!(
        instance.field("age").and_then(|v| v.as_data_type::<NullInt64>()),
        Some(&NullInt64 { value: 1, valid: false })
    );
    assert!(instance.field("member_number").unwrap().is_null());

    let subs = instance.field("test_sub_models1").and_then(|v| v.as_slice()).unwrap();
    assert_eq!(subs.len(), 2);
    assert!(subs[0].as_entity().is_some());
    assert!(subs[1].is_null());
}

#[test]
fn test_dynamic_json_matches_original() {
    init_logger();
    let schemas = SchemaRegistry::new();
    let (_, _, ds) = rebuild_types(&schemas);
    let model = test_model(Utc::now());

    let original = serde_json::to_value(&model).unwrap();
    let instance = ds.instance_from_json(&serde_json::to_vec(&model).unwrap()).unwrap();
    let dynamic = instance.to_json().unwrap();

    let mut expected = original.clone();
    let object = expected.as_object_mut().unwrap();
    object.remove("ignore_me");
    object.remove("ignore_me1");
    assert_eq!(dynamic, expected);

    let restored: TestModel = serde_json::from_value(dynamic).unwrap();
    assert_eq!(restored, model);
    println!("✅ 动态实例 JSON 与原始类型一致");
}

#[test]
fn test_wire_name_survives_dynamic_round_trip() {
    init_logger();
    let schemas = SchemaRegistry::new();
    let (key, fields) = schemas.register_entity::<Account>().unwrap();
    assert_eq!(fields[1].name, "userName");

    let types = TypeRegistry::new();
    let ds = Builder::new()
        .add_entity_field_definition(&fields, &types)
        .build()
        .unwrap();
    let ds = types.insert(key, ds);

    let account = Account { id: 7, user_name: "neo".to_string() };
    let original = serde_json::to_value(&account).unwrap();
    let instance = ds.instance_from_json(&serde_json::to_vec(&account).unwrap()).unwrap();
    assert_eq!(instance.to_json().unwrap(), original);

    let restored: Account = serde_json::from_value(instance.to_json().unwrap()).unwrap();
    assert_eq!(restored, account);
}

#[test]
fn test_serde_rename_attribute_is_rejected() {
    let schemas = SchemaRegistry::new();
    let err = schemas.register_entity::<RawRenamedAccount>().unwrap_err();
    assert!(matches!(err, ShimError::InvalidEntityError { .. }));
    assert!(schemas.is_empty());
}

#[test]
fn test_zero_instance_serializes_like_empty_model() {
    let schemas = SchemaRegistry::new();
    let (_, sub_ds, _) = rebuild_types(&schemas);
    let json = sub_ds.new_instance().to_json().unwrap();
    assert_eq!(json["id"], serde_json::json!(0));
    assert_eq!(json["name"], serde_json::json!(""));
    assert!(json["deleted_at"].is_null());
    assert!(json["created_at"].is_string());
}

#[test]
fn test_register_is_idempotent_and_concurrent() {
    init_logger();
    let schemas = SchemaRegistry::new();
    let (_, first) = schemas.register_entity::<TestModel>().unwrap();
    let (_, second) = schemas.register_value(&test_model(Utc::now())).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(schemas.len(), 2);

    let fresh = SchemaRegistry::new();
    let results: Vec<Arc<Vec<FieldDefinition>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| fresh.register_entity::<TestModel>().unwrap().1))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for result in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], result));
    }
    assert_eq!(fresh.len(), 2);
    assert_eq!(*results[0], *first);
}

#[test]
fn test_pointer_to_entity_and_custom_key() {
    let schemas = SchemaRegistry::new();
    let (key, _) = schemas.register_entity::<Option<TestSubModel>>().unwrap();
    assert_eq!(key, EntityKey::of::<TestSubModel>());

    let (key, fields) = schemas.register_entity::<Renamed>().unwrap();
    assert_eq!(key.as_str(), "shop.Renamed");
    assert!(Arc::ptr_eq(&fields, &schemas.get("shop.Renamed").unwrap()));
}

#[test]
fn test_invalid_and_unsupported_entities() {
    init_logger();
    let schemas = SchemaRegistry::new();

    let err = schemas.register_entity::<String>().unwrap_err();
    assert!(matches!(err, ShimError::InvalidEntityError { .. }));
    let err = schemas.register_entity::<Vec<TestSubModel>>().unwrap_err();
    assert!(matches!(err, ShimError::InvalidEntityError { .. }));

    let err = schemas.register_entity::<WithMap>().unwrap_err();
    assert!(matches!(err, ShimError::UnsupportedKindError { ref field, .. } if field == "props"));
    assert!(!schemas.contains(EntityKey::of::<WithMap>().as_str()));
    assert!(schemas.is_empty());
}

#[test]
fn test_recursive_entity_fails_without_poisoning() {
    init_logger();
    let schemas = SchemaRegistry::new();
    for _ in 0..2 {
        let err = schemas.register_entity::<TreeNode>().unwrap_err();
        assert!(matches!(err, ShimError::UnsupportedKindError { .. }));
    }
    assert!(schemas.is_empty());

    assert!(schemas.register_entity::<TestSubModel>().is_ok());
    assert_eq!(schemas.len(), 1);
}

#[test]
fn test_unresolved_nested_entity() {
    let schemas = SchemaRegistry::new();
    let (_, fields) = schemas.register_entity::<TestModel>().unwrap();

    let empty = TypeRegistry::new();
    let err = Builder::new()
        .add_entity_field_definition(&fields, &empty)
        .build()
        .unwrap_err();
    assert!(matches!(err, ShimError::UnresolvedReferenceError { .. }));
    assert!(empty.is_empty());
}

#[test]
fn test_ignore_keys_follow_config() {
    let config = ShimConfig::builder().ignore_tag_keys(["sql"]).build().unwrap();
    let schemas = SchemaRegistry::with_config(config);
    let (_, fields) = schemas.register_entity::<TestModel>().unwrap();
    assert!(fields.iter().any(|f| f.name == "ignore_me"));
    assert!(fields.iter().any(|f| f.name == "ignore_me1" && f.is_pointer));
}

mod custom_data_type {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct Money {
        pub cents: i64,
        pub currency: String,
    }

    impl DataType for Money {
        const KEY: DataTypeKey = DataTypeKey(64);
        const NAME: &'static str = "money";
    }

    impl Reflect for Money {
        fn shape() -> TypeShape {
            TypeShape::data_type::<Money>()
        }
    }

    define_entity! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Order {
            pub id: u64,
            pub total: Money,
            pub refunds: Vec<Money>,
        }
    }

    #[test]
    fn test_custom_data_type_through_builder_and_codec() {
        let data_types = Arc::new(DataTypeRegistry::builtin().with::<Money>().unwrap());

        let schemas = SchemaRegistry::new();
        let (_, fields) = schemas.register_entity::<Order>().unwrap();
        assert_eq!(fields[1].data_type, Some(Money::KEY));
        assert!(fields[2].is_slice);

        let types = TypeRegistry::new();
        let err = Builder::new()
            .add_entity_field_definition(&fields, &types)
            .build()
            .unwrap_err();
        assert!(matches!(err, ShimError::UnresolvedReferenceError { .. }));

        let ds = Arc::new(
            Builder::with_data_types(Arc::clone(&data_types))
                .add_entity_field_definition(&fields, &types)
                .build()
                .unwrap(),
        );
        let order = Order {
            id: 9,
            total: Money { cents: 1250, currency: "CNY".to_string() },
            refunds: vec![Money { cents: 50, currency: "CNY".to_string() }],
        };
        let instance = ds.instance_from_json(&serde_json::to_vec(&order).unwrap()).unwrap();
        assert_eq!(instance.field("total").and_then(|v| v.as_data_type::<Money>()), Some(&order.total));
        assert_eq!(instance.to_json().unwrap(), serde_json::to_value(&order).unwrap());

        let codec = ConditionValueCodec::new(data_types);
        let value = Value::data_type(order.total.clone());
        let encoded = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(encoded.as_bytes()).unwrap(), value);
        assert!(ConditionValueCodec::default().encode(&value).is_err());
    }
}
