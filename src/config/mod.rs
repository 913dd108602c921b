//! # 配置管理模块
//!
//! 提供实体提取的配置类型，支持构建器模式和链式配置

pub mod builders;
pub mod core;

pub use builders::ShimConfigBuilder;
pub use core::{DEFAULT_IGNORE_TAG_KEYS, DEFAULT_MAX_NESTING_DEPTH, ShimConfig};
