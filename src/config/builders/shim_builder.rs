//! # 提取配置构建器模块

use crate::config::core::{DEFAULT_IGNORE_TAG_KEYS, DEFAULT_MAX_NESTING_DEPTH, ShimConfig};
use crate::error::ShimResult;
use rat_logger::info;

/// 提取配置构建器
///
/// 未设置的项取默认值：忽略标签键为 `gorm`、`ormdb`
#[derive(Debug)]
pub struct ShimConfigBuilder {
    ignore_tag_keys: Option<Vec<String>>,
    max_nesting_depth: Option<usize>,
}

impl ShimConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            ignore_tag_keys: None,
            max_nesting_depth: None,
        }
    }

    /// 设置忽略标签键（替换默认值）
    ///
    /// # 参数
    ///
    /// * `keys` - 标签键列表
    pub fn ignore_tag_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_tag_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// 追加一个忽略标签键
    pub fn ignore_tag_key<S: Into<String>>(mut self, key: S) -> Self {
        self.ignore_tag_keys
            .get_or_insert_with(|| DEFAULT_IGNORE_TAG_KEYS.iter().map(|k| k.to_string()).collect())
            .push(key.into());
        self
    }

    /// 设置最大嵌套深度
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = Some(depth);
        self
    }

    /// 构建配置
    ///
    /// # 错误
    ///
    /// 忽略标签键为空字符串或最大嵌套深度为0时返回配置错误
    pub fn build(self) -> ShimResult<ShimConfig> {
        let defaults = ShimConfig::default();
        let config = ShimConfig {
            ignore_tag_keys: self.ignore_tag_keys.unwrap_or(defaults.ignore_tag_keys),
            max_nesting_depth: self.max_nesting_depth.unwrap_or(DEFAULT_MAX_NESTING_DEPTH),
        };
        config.validate()?;

        info!(
            "创建提取配置: 忽略标签键={:?}, 最大嵌套深度={}",
            config.ignore_tag_keys, config.max_nesting_depth
        );
        Ok(config)
    }
}

impl Default for ShimConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
