//! 错误类型定义
//!
//! 实体提取、动态类型构建以及查询参数编解码共用的错误类型

use thiserror::Error;

/// rat_shim 统一错误类型
#[derive(Error, Debug)]
pub enum ShimError {
    /// 提取输入不是实体（结构体或指向结构体的可空包装）
    #[error("无效的实体类型: {message}")]
    InvalidEntityError { message: String },

    /// 无法表示的字段或值类型，包括递归引用尚在提取中的祖先实体
    #[error("不支持的字段类型: {field} ({kind})")]
    UnsupportedKindError { field: String, kind: String },

    /// 构建时在注册表中找不到引用的实体或数据类型
    #[error("无法解析的引用: {reference}")]
    UnresolvedReferenceError { reference: String },

    /// 编码时遇到不支持的具体类型
    #[error("无法编码的参数值: {message}")]
    UnencodableValueError { message: String },

    /// 解码时遇到无法识别的类型标识（编码端与解码端版本不一致）
    #[error("未知的参数编码: {message}")]
    UnknownEncodingError { message: String },

    /// 负载序列化/反序列化失败
    #[error("数据序列化失败: {message}")]
    SerializationError { message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    ConfigError { message: String },

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
}

/// 结果类型别名
pub type ShimResult<T> = Result<T, ShimError>;

impl From<bincode::Error> for ShimError {
    fn from(err: bincode::Error) -> Self {
        ShimError::SerializationError {
            message: format!("bincode: {}", err),
        }
    }
}

impl From<serde_json::Error> for ShimError {
    fn from(err: serde_json::Error) -> Self {
        ShimError::SerializationError {
            message: format!("JSON: {}", err),
        }
    }
}

/// 便捷宏：构造携带消息的错误
#[macro_export]
macro_rules! shim_error {
    (invalid_entity, $msg:expr) => {
        $crate::error::ShimError::InvalidEntityError { message: $msg.to_string() }
    };
    (unencodable, $msg:expr) => {
        $crate::error::ShimError::UnencodableValueError { message: $msg.to_string() }
    };
    (unknown_encoding, $msg:expr) => {
        $crate::error::ShimError::UnknownEncodingError { message: $msg.to_string() }
    };
    (serialization, $msg:expr) => {
        $crate::error::ShimError::SerializationError { message: $msg.to_string() }
    };
    (config, $msg:expr) => {
        $crate::error::ShimError::ConfigError { message: $msg.to_string() }
    };
    (unsupported, $field:expr, $kind:expr) => {
        $crate::error::ShimError::UnsupportedKindError {
            field: $field.to_string(),
            kind: $kind.to_string(),
        }
    };
    (unresolved, $reference:expr) => {
        $crate::error::ShimError::UnresolvedReferenceError { reference: $reference.to_string() }
    };
}
