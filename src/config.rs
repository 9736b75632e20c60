/// 引擎配置
///
/// 所有字段都有默认值，配置文件可以只写需要修改的部分。
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::segment::Segmenter;
use crate::utils::FixerError;

fn default_output_prefix() -> String {
    "fixed_".to_string()
}

fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 句子切分策略，提取与重建必须一致
    #[serde(default)]
    pub segmenter: Segmenter,

    /// 输出文件名前缀
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// 是否按内容文件并行处理
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// 覆盖已有输出文件前是否先备份
    #[serde(default)]
    pub create_backup: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            segmenter: Segmenter::default(),
            output_prefix: default_output_prefix(),
            parallel: default_parallel(),
            create_backup: false,
        }
    }
}

impl EngineConfig {
    /// 从 JSON 文件加载
    pub fn from_file(path: &Path) -> Result<Self, FixerError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FixerError> {
        if self.output_prefix.contains(['/', '\\']) {
            return Err(FixerError::InvalidConfig(format!(
                "output_prefix must not contain path separators: {}",
                self.output_prefix
            )));
        }
        Ok(())
    }

    /// 输出文件名：前缀 + 原文件名
    pub fn output_file_name(&self, input_file_name: &str) -> String {
        format!("{}{}", self.output_prefix, input_file_name)
    }
}
