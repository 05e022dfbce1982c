//! 编解码层错误类型定义

use thiserror::Error;

/// 标签配置错误
///
/// 在加载 `LabelSpec` 时检测，属于致命错误：配置无效时不得进入控制循环。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 标签数量不足（至少需要一个完整的 6 自由度位姿）
    #[error("Label set must contain at least {min} names, got {actual}")]
    TooFewLabels { min: usize, actual: usize },

    /// 标签名重复
    #[error("Duplicate label name: '{name}'")]
    DuplicateLabel { name: String },

    /// 目标标签不在 `label_names` 中
    #[error("Target label '{name}' is not in label_names")]
    UnknownTargetLabel { name: String },

    /// 周期标签不在 `target_label_names` 中
    #[error("Periodic label '{name}' is not a target label")]
    PeriodicNotTarget { name: String },

    /// 数组长度不匹配
    #[error("Length mismatch for {field}: expected {expected}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 归一化区间退化（`llim >= ulim`）
    #[error("Degenerate limits for '{name}': llim={llim}, ulim={ulim} (need llim < ulim)")]
    DegenerateLimits { name: String, llim: f64, ulim: f64 },

    /// 目标权重为零或非有限值
    #[error("Invalid weight for '{name}': {weight} (must be finite and non-zero)")]
    InvalidWeight { name: String, weight: f64 },

    /// 配置数组中出现 NaN / Inf
    #[error("Non-finite value in {field}[{index}]")]
    NonFinite { field: &'static str, index: usize },
}

/// 网络输出解码错误
///
/// 中止当前步（以及所在的 episode），不会被静默补零。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// 输出张量维度与 `LabelSpec` 的编码长度不一致
    #[error("Estimator output has {actual} components, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 输出中包含 NaN / Inf
    #[error("Estimator output component {index} is not finite")]
    NonFinite { index: usize },
}

/// 编解码层统一错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 解码错误
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// 查询了不存在的标签
    #[error("Unknown label: '{name}'")]
    UnknownLabel { name: String },

    /// 批量指标的标签与预测行数不一致
    #[error("Batch length mismatch: {labels} labels vs {predictions} predictions")]
    BatchLength { labels: usize, predictions: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::DegenerateLimits {
            name: "x".to_string(),
            llim: 1.0,
            ulim: 1.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("'x'") && msg.contains("llim < ulim"), "{}", msg);

        let err = ConfigError::LengthMismatch {
            field: "llims",
            expected: 6,
            actual: 5,
        };
        assert_eq!(
            format!("{}", err),
            "Length mismatch for llims: expected 6, got 5"
        );
    }

    #[test]
    fn test_from_decode_error() {
        let err: CodecError = DecodeError::DimensionMismatch {
            expected: 3,
            actual: 2,
        }
        .into();
        match err {
            CodecError::Decode(DecodeError::DimensionMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (3, 2));
            },
            _ => panic!("Expected Decode variant"),
        }
    }
}
