//! # 训练产物文件
//!
//! 标签配置与控制参数文档随模型一起保存，伺服时重新加载。
//! 格式由扩展名决定：`.json`（默认）或 `.toml`。
//!
//! JSON 使用 `float_roundtrip` 解析，`llims` / `ulims` / 权重逐位一致地重新加载。

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tactile_codec::LabelSpec;
use tactile_control::{ControlDocument, ServoConfig};
use tracing::debug;

/// 产物文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Toml,
}

impl ArtifactFormat {
    /// 根据扩展名判断格式（无扩展名时为 JSON）
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            None => Ok(ArtifactFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ArtifactFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(ArtifactFormat::Toml),
            Some(ext) => bail!("Unsupported artifact extension: .{}", ext),
        }
    }

    /// 序列化为文本
    pub fn to_string<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            ArtifactFormat::Json => {
                serde_json::to_string_pretty(value).context("Failed to serialize JSON")
            },
            ArtifactFormat::Toml => toml::to_string_pretty(value).context("Failed to serialize TOML"),
        }
    }

    /// 从文本反序列化
    pub fn from_str<T: DeserializeOwned>(self, text: &str) -> Result<T> {
        match self {
            ArtifactFormat::Json => serde_json::from_str(text).context("Invalid JSON document"),
            ArtifactFormat::Toml => toml::from_str(text).context("Invalid TOML document"),
        }
    }
}

fn load<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let format = ArtifactFormat::from_path(path)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} from {}", what, path.display()))?;
    let value = format
        .from_str(&text)
        .with_context(|| format!("Failed to load {} from {}", what, path.display()))?;
    debug!("Loaded {} from {}", what, path.display());
    Ok(value)
}

fn save<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    let format = ArtifactFormat::from_path(path)?;
    let text = format.to_string(value)?;
    fs::write(path, text)
        .with_context(|| format!("Failed to write {} to {}", what, path.display()))?;
    debug!("Saved {} to {}", what, path.display());
    Ok(())
}

/// 加载并校验标签配置
pub fn load_label_spec<P: AsRef<Path>>(path: P) -> Result<LabelSpec> {
    load(path.as_ref(), "label spec")
}

pub fn save_label_spec<P: AsRef<Path>>(spec: &LabelSpec, path: P) -> Result<()> {
    save(spec, path.as_ref(), "label spec")
}

/// 加载并校验控制参数文档（任务 → 参数）
pub fn load_control_document<P: AsRef<Path>>(path: P) -> Result<ControlDocument> {
    load(path.as_ref(), "control parameters")
}

pub fn save_control_document<P: AsRef<Path>>(document: &ControlDocument, path: P) -> Result<()> {
    save(document, path.as_ref(), "control parameters")
}

/// 加载伺服循环配置（缺省字段取默认值）
pub fn load_servo_config<P: AsRef<Path>>(path: P) -> Result<ServoConfig> {
    load(path.as_ref(), "servo config")
}
