//! 日志初始化
//!
//! 安装 `tracing` 全局订阅者（`RUST_LOG` 过滤 + fmt 输出），
//! 并通过 `LogTracer` 把依赖库的 `log` 记录转发到 `tracing`。

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;

/// 日志初始化错误
#[derive(Error, Debug)]
pub enum LoggingError {
    /// 默认过滤指令无法解析
    #[error("Invalid log directive '{directive}': {source}")]
    Directive {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// `log` 记录器已被设置
    #[error("Failed to install log bridge: {0}")]
    LogBridge(#[from] log::SetLoggerError),

    /// 全局订阅者已被设置
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// 初始化日志
///
/// `default_directive` 在 `RUST_LOG` 之外追加，例如 `"tactile_servo_cli=info"`。
/// 日志写到标准错误，标准输出留给命令结果。每个进程只能成功调用一次。
pub fn init_logging(default_directive: &str) -> Result<(), LoggingError> {
    let directive = default_directive
        .parse::<Directive>()
        .map_err(|source| LoggingError::Directive {
            directive: default_directive.to_string(),
            source,
        })?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_directive() {
        let err = init_logging("tactile=notalevel").unwrap_err();
        assert!(matches!(err, LoggingError::Directive { .. }));
    }

    #[test]
    fn test_second_init_fails() {
        // 同一进程中只有第一次成功（其他测试可能已初始化）
        let _ = init_logging("tactile_servo=debug");
        assert!(init_logging("tactile_servo=debug").is_err());
    }
}
