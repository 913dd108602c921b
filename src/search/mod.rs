//! 查询条件集模块
//!
//! 累积 where/or/not 条件、排序、分页，参数经编解码器转换为可跨进程传递的字节

use crate::codec::{ConditionValueCodec, EncodedArgument, Value};
use crate::error::ShimResult;
use rat_logger::debug;
use serde::ser::Error as SerError;
use serde::{Deserialize, Serialize, Serializer};

/// 单个查询条件：原始谓词文本与有序参数
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub query: String,
    pub args: Vec<Value>,
}

impl Condition {
    pub fn new(query: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            query: query.into(),
            args,
        }
    }

    fn encode(&self, codec: &ConditionValueCodec) -> ShimResult<EncodedCondition> {
        let args = self
            .args
            .iter()
            .map(|arg| codec.encode(arg))
            .collect::<ShimResult<Vec<_>>>()?;
        Ok(EncodedCondition {
            query: self.query.clone(),
            args,
        })
    }
}

/// 查询条件集
///
/// 修改方法只追加或覆盖，不会删除已有条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Search {
    pub where_conditions: Vec<Condition>,
    pub or_conditions: Vec<Condition>,
    pub not_conditions: Vec<Condition>,
    pub order_conditions: Vec<String>,
    pub limit_condition: Option<i64>,
    pub offset_condition: Option<i64>,
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加 where 条件
    pub fn and_where(&mut self, query: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.where_conditions.push(Condition::new(query, args));
        self
    }

    /// 追加 or 条件
    pub fn or_where(&mut self, query: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.or_conditions.push(Condition::new(query, args));
        self
    }

    /// 追加 not 条件
    pub fn not_where(&mut self, query: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.not_conditions.push(Condition::new(query, args));
        self
    }

    /// 追加排序
    pub fn order(&mut self, value: impl Into<String>) -> &mut Self {
        self.order_conditions.push(value.into());
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.limit_condition = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.offset_condition = Some(offset);
        self
    }

    /// 编码全部参数，得到可传输的条件集
    pub fn to_payload(&self, codec: &ConditionValueCodec) -> ShimResult<SearchPayload> {
        let encode_all = |conditions: &[Condition]| {
            conditions
                .iter()
                .map(|c| c.encode(codec))
                .collect::<ShimResult<Vec<_>>>()
        };
        let payload = SearchPayload {
            where_conditions: encode_all(&self.where_conditions)?,
            or_conditions: encode_all(&self.or_conditions)?,
            not_conditions: encode_all(&self.not_conditions)?,
            order_conditions: self.order_conditions.clone(),
            limit_condition: self.limit_condition,
            offset_condition: self.offset_condition,
        };
        debug!(
            "编码查询条件集: where={}, or={}, not={}",
            payload.where_conditions.len(),
            payload.or_conditions.len(),
            payload.not_conditions.len()
        );
        Ok(payload)
    }
}

/// 使用内置数据类型编码参数后序列化
impl Serialize for Search {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_payload(&ConditionValueCodec::default())
            .map_err(<S::Error as SerError>::custom)?
            .serialize(serializer)
    }
}

/// 已编码的查询条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCondition {
    pub query: String,
    pub args: Vec<EncodedArgument>,
}

impl EncodedCondition {
    pub fn decode(&self, codec: &ConditionValueCodec) -> ShimResult<Condition> {
        Ok(Condition {
            query: self.query.clone(),
            args: codec.decode_values(&self.args)?,
        })
    }
}

/// 传输形式的查询条件集
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPayload {
    pub where_conditions: Vec<EncodedCondition>,
    pub or_conditions: Vec<EncodedCondition>,
    pub not_conditions: Vec<EncodedCondition>,
    pub order_conditions: Vec<String>,
    pub limit_condition: Option<i64>,
    pub offset_condition: Option<i64>,
}

impl SearchPayload {
    /// 解码全部参数，重建条件集
    pub fn decode(&self, codec: &ConditionValueCodec) -> ShimResult<Search> {
        let decode_all = |conditions: &[EncodedCondition]| {
            conditions
                .iter()
                .map(|c| c.decode(codec))
                .collect::<ShimResult<Vec<_>>>()
        };
        Ok(Search {
            where_conditions: decode_all(&self.where_conditions)?,
            or_conditions: decode_all(&self.or_conditions)?,
            not_conditions: decode_all(&self.not_conditions)?,
            order_conditions: self.order_conditions.clone(),
            limit_condition: self.limit_condition,
            offset_condition: self.offset_condition,
        })
    }
}

/// 使用内置数据类型按顺序解码参数列表
///
/// 任一参数解码失败即返回错误，不返回部分结果
pub fn decode_search_values(arguments: &[EncodedArgument]) -> ShimResult<Vec<Value>> {
    ConditionValueCodec::default().decode_values(arguments)
}

/// 便捷宏：构造查询参数列表
///
/// ```ignore
/// search.and_where("id = ? AND name IN (?)", search_args!["123", vec!["a", "b"]]);
/// ```
#[macro_export]
macro_rules! search_args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::codec::Value::from($arg)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShimError;
    use crate::types::NullInt64;

    #[test]
    fn test_mutators_accumulate() {
        let mut search = Search::new();
        search
            .and_where("a = ?", crate::search_args![1i64])
            .and_where("b = ?", crate::search_args!["x"])
            .order("a")
            .order("b desc")
            .limit(5)
            .limit(20)
            .offset(10);
        assert_eq!(search.where_conditions.len(), 2);
        assert_eq!(search.order_conditions, vec!["a", "b desc"]);
        assert_eq!(search.limit_condition, Some(20));
        assert_eq!(search.offset_condition, Some(10));
        assert!(search.or_conditions.is_empty());
    }

    #[test]
    fn test_payload_round_trip() {
        let codec = ConditionValueCodec::default();
        let mut search = Search::new();
        search
            .or_where("age = ?", crate::search_args![NullInt64::new(3)])
            .not_where("name IN (?)", crate::search_args![vec!["a", "b"]]);

        let payload = search.to_payload(&codec).unwrap();
        assert_eq!(payload.decode(&codec).unwrap(), search);
    }

    #[test]
    fn test_unencodable_argument_fails_serialization() {
        #[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
        struct Unregistered(u8);

        impl crate::types::DataType for Unregistered {
            const KEY: crate::types::DataTypeKey = crate::types::DataTypeKey(240);
            const NAME: &'static str = "unregistered";
        }

        let mut search = Search::new();
        search.and_where("x = ?", vec![Value::data_type(Unregistered(1))]);
        let err = search.to_payload(&ConditionValueCodec::default()).unwrap_err();
        assert!(matches!(err, ShimError::UnencodableValueError { .. }));
        assert!(serde_json::to_string(&search).is_err());
    }
}
