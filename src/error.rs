use thiserror::Error;

/// 应用程序错误类型
///
/// 业务拒绝（如“人數已滿”）不属于错误，见 [`crate::models::Outcome`]。
#[derive(Debug, Error)]
pub enum AppError {
    /// 认证失败（账号或密码错误），不可重试
    #[error("认证失败: {reason}")]
    Auth { reason: String },

    /// 网络请求失败，调用方可自行重试
    #[error("网络请求失败 ({url}): {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 服务器返回非 2xx 状态码
    #[error("HTTP 状态异常 ({url}): {status}")]
    HttpStatus { url: String, status: u16 },

    /// 流程步骤校验失败（页面缺少预期标记）
    #[error("流程步骤 {step} 失败: {reason}")]
    Workflow { step: String, reason: String },

    /// 页面结构解析失败
    #[error("页面解析失败: {0}")]
    Parse(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML解析失败: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        AppError::Transport {
            url,
            source: Box::new(err),
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建认证失败错误
    pub fn auth(reason: impl Into<String>) -> Self {
        AppError::Auth {
            reason: reason.into(),
        }
    }

    /// 创建网络请求失败错误
    pub fn transport(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// 创建流程步骤失败错误
    pub fn workflow(step: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Workflow {
            step: step.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        AppError::Parse(msg.into())
    }

    /// 是否为认证错误
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Auth { .. })
    }

    /// 是否值得由调用方重试
    ///
    /// 只有网络层错误可以重试；认证与流程错误需要人工介入或页面已变化。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Transport { .. } | AppError::HttpStatus { .. }
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::transport("https://x", "connection reset").is_retryable());
        assert!(AppError::HttpStatus {
            url: "https://x".into(),
            status: 502
        }
        .is_retryable());
        assert!(!AppError::auth("incorrect credential").is_retryable());
        assert!(!AppError::workflow("ge_list", "marker missing").is_retryable());
    }

    #[test]
    fn test_display_contains_step_name() {
        let err = AppError::workflow("direct_check", "缺少 0348");
        let text = err.to_string();
        assert!(text.contains("direct_check"));
        assert!(text.contains("0348"));
    }
}
