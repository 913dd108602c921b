//! 查询参数编解码模块
//!
//! 将类型擦除的查询参数编码为自描述的字节序列，使没有编译期类型信息的一端能够还原原始值。
//!
//! 编码格式：
//!
//! | 偏移 | 内容 |
//! |---|---|
//! | 0 | 切片标志：`1` 切片，`0` 单值 |
//! | 1 | 类别标志：`0` 基础值，`1` 数据类型 |
//! | 2.. | 基础值：varint 种类编号 + bincode 负载；数据类型：一字节类型键 + bincode 负载 |

pub mod value;

pub use value::Value;

use crate::debug_log;
use crate::error::ShimResult;
use crate::types::{builtin_data_types, DataTypeKey, DataTypeRegistry, DataTypeValue, Kind, Primitive};
use prost::encoding::{decode_varint, encode_varint};
use rat_logger::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 单值标志
pub const NO_SLICE_TYPE_FLAG: u8 = 0;
/// 切片标志
pub const SLICE_TYPE_FLAG: u8 = 1;
/// 基础值类别
pub const PRIMITIVE_FLAG: u8 = 0;
/// 数据类型类别
pub const DATA_TYPE_FLAG: u8 = 1;

/// 最短的合法编码长度
const MIN_ENCODED_LEN: usize = 3;

/// 编码后的参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedArgument(Vec<u8>);

impl EncodedArgument {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for EncodedArgument {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EncodedArgument {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 查询参数编解码器
///
/// 编码端与解码端必须使用键一致的数据类型注册表
#[derive(Debug, Clone)]
pub struct ConditionValueCodec {
    data_types: Arc<DataTypeRegistry>,
}

impl Default for ConditionValueCodec {
    fn default() -> Self {
        Self::new(builtin_data_types())
    }
}

impl ConditionValueCodec {
    pub fn new(data_types: Arc<DataTypeRegistry>) -> Self {
        Self { data_types }
    }

    pub fn data_types(&self) -> &Arc<DataTypeRegistry> {
        &self.data_types
    }

    /// 编码单个参数
    pub fn encode(&self, value: &Value) -> ShimResult<EncodedArgument> {
        let result = self.encode_inner(value);
        if let Err(e) = &result {
            warn!("参数编码失败: {:?}: {}", value, e);
        }
        result
    }

    fn encode_inner(&self, value: &Value) -> ShimResult<EncodedArgument> {
        let bytes = match value {
            Value::Primitive(p) => {
                let mut buf = primitive_header(NO_SLICE_TYPE_FLAG, p.kind());
                buf.extend(bincode::serialize(p)?);
                buf
            }
            Value::PrimitiveSlice(kind, items) => {
                if !kind.is_primitive() {
                    return Err(crate::shim_error!(unencodable, format!("{} 不是基础种类", kind)));
                }
                if let Some(item) = items.iter().find(|p| p.kind() != *kind) {
                    return Err(crate::shim_error!(
                        unencodable,
                        format!("切片元素种类 {} 与声明的种类 {} 不一致", item.kind(), kind)
                    ));
                }
                let mut buf = primitive_header(SLICE_TYPE_FLAG, *kind);
                buf.extend(bincode::serialize(items)?);
                buf
            }
            Value::DataType(v) => {
                let key = v.data_type_key();
                let handler = self.data_types.get(key).ok_or_else(|| {
                    crate::shim_error!(unencodable, format!("未登记的数据类型 {} ({})", key, v.data_type_name()))
                })?;
                if handler.value_type_id() != v.value_type_id() {
                    return Err(crate::shim_error!(
                        unencodable,
                        format!("数据类型键 {} 登记为 {}，实际值为 {}", key, handler.name(), v.data_type_name())
                    ));
                }
                let mut buf = vec![NO_SLICE_TYPE_FLAG, DATA_TYPE_FLAG, key.0];
                buf.extend(v.to_payload()?);
                buf
            }
            Value::DataTypeSlice(key, items) => {
                let handler = self.data_types.get(*key).ok_or_else(|| {
                    crate::shim_error!(unencodable, format!("未登记的数据类型 {}", key))
                })?;
                let mut buf = vec![SLICE_TYPE_FLAG, DATA_TYPE_FLAG, key.0];
                buf.extend(handler.encode_slice(items)?);
                buf
            }
        };
        debug_log!("参数编码: {:?} -> {} 字节", value, bytes.len());
        Ok(EncodedArgument(bytes))
    }

    /// 解码单个参数
    pub fn decode(&self, bytes: &[u8]) -> ShimResult<Value> {
        if bytes.len() < MIN_ENCODED_LEN {
            return Err(crate::shim_error!(
                unknown_encoding,
                format!("编码长度 {} 小于最短长度 {}", bytes.len(), MIN_ENCODED_LEN)
            ));
        }
        let is_slice = match bytes[0] {
            NO_SLICE_TYPE_FLAG => false,
            SLICE_TYPE_FLAG => true,
            other => {
                return Err(crate::shim_error!(unknown_encoding, format!("未知的切片标志: {}", other)));
            }
        };

        match bytes[1] {
            PRIMITIVE_FLAG => {
                let mut rest = &bytes[2..];
                let id = decode_varint(&mut rest).map_err(|e| {
                    crate::shim_error!(unknown_encoding, format!("种类编号无效: {}", e))
                })?;
                let kind = Kind::try_from(id)
                    .map_err(|e| crate::shim_error!(unknown_encoding, e))?;
                if !kind.is_primitive() {
                    return Err(crate::shim_error!(unknown_encoding, format!("{} 不是基础种类", kind)));
                }
                if is_slice {
                    Ok(Value::PrimitiveSlice(kind, Primitive::decode_slice_payload(kind, rest)?))
                } else {
                    Ok(Value::Primitive(Primitive::decode_payload(kind, rest)?))
                }
            }
            DATA_TYPE_FLAG => {
                let key = DataTypeKey(bytes[2]);
                let handler = self.data_types.get(key).ok_or_else(|| {
                    crate::shim_error!(unknown_encoding, format!("未登记的数据类型 {}", key))
                })?;
                let payload = &bytes[3..];
                if is_slice {
                    Ok(Value::DataTypeSlice(key, handler.decode_slice(payload)?))
                } else {
                    Ok(Value::DataType(handler.decode(payload)?))
                }
            }
            other => Err(crate::shim_error!(unknown_encoding, format!("未知的类别标志: {}", other))),
        }
    }

    /// 按顺序解码参数列表，遇到第一个错误即返回
    pub fn decode_values(&self, arguments: &[EncodedArgument]) -> ShimResult<Vec<Value>> {
        arguments
            .iter()
            .map(|argument| self.decode(argument.as_bytes()))
            .collect()
    }
}

fn primitive_header(slice_flag: u8, kind: Kind) -> Vec<u8> {
    let mut buf = vec![slice_flag, PRIMITIVE_FLAG];
    encode_varint(u64::from(u8::from(kind)), &mut buf);
    buf
}
