//! # 配置管理模块 - 核心配置类型
//!
//! 实体提取的配置项，可通过构建器创建，也可从 TOML/JSON 文件加载

use crate::error::{ShimError, ShimResult};
use rat_logger::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 默认的忽略标签键
pub const DEFAULT_IGNORE_TAG_KEYS: [&str; 2] = ["gorm", "ormdb"];

/// 默认的最大嵌套深度
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// 实体提取配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimConfig {
    /// 标签值为 `-` 时忽略字段的标签键
    pub ignore_tag_keys: Vec<String>,
    /// 实体嵌套的最大深度（顶层实体为 1）
    pub max_nesting_depth: usize,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            ignore_tag_keys: DEFAULT_IGNORE_TAG_KEYS.iter().map(|k| k.to_string()).collect(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl ShimConfig {
    /// 创建配置构建器
    pub fn builder() -> super::builders::ShimConfigBuilder {
        super::builders::ShimConfigBuilder::new()
    }

    /// 检查配置项是否有效
    pub fn validate(&self) -> ShimResult<()> {
        if self.max_nesting_depth == 0 {
            return Err(crate::shim_error!(config, "最大嵌套深度必须大于0"));
        }
        if let Some(key) = self.ignore_tag_keys.iter().find(|k| k.trim().is_empty()) {
            return Err(crate::shim_error!(
                config,
                format!("忽略标签键不能为空: {:?}", key)
            ));
        }
        Ok(())
    }

    /// 从配置文件加载配置
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径，扩展名为 `toml` 时按 TOML 解析，否则按 JSON 解析
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> ShimResult<Self> {
        let content = std::fs::read_to_string(config_path.as_ref()).map_err(ShimError::IoError)?;

        let config: ShimConfig = if is_toml(config_path.as_ref()) {
            toml::from_str(&content)
                .map_err(|e| crate::shim_error!(config, format!("解析TOML配置文件失败: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| crate::shim_error!(config, format!("解析JSON配置文件失败: {}", e)))?
        };
        config.validate()?;

        info!("从文件加载配置: {:?}", config_path.as_ref());
        Ok(config)
    }

    /// 保存配置到文件
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn save_to_file<P: AsRef<Path>>(&self, config_path: P) -> ShimResult<()> {
        let content = if is_toml(config_path.as_ref()) {
            toml::to_string_pretty(self)
                .map_err(|e| crate::shim_error!(config, format!("序列化TOML配置失败: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| crate::shim_error!(config, format!("序列化JSON配置失败: {}", e)))?
        };

        std::fs::write(config_path.as_ref(), content).map_err(ShimError::IoError)?;

        info!("保存配置到文件: {:?}", config_path.as_ref());
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}
