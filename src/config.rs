use crate::error::{AppError, Result};
use crate::models::endpoints::{ACAD_BASE, PORTAL_BASE, USER_AGENT};
use crate::models::{Credential, FillingPolicy, PortalUrls};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// 程序配置
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 学号
    pub username: String,
    /// 密码
    pub password: String,
    /// 请求头中的浏览器标识
    pub user_agent: String,
    /// 校园入口首页
    pub portal_base_url: String,
    /// 教务系统主机
    pub acad_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 选课监控 ---
    /// 监控的选课号码
    pub monitor_codes: Vec<String>,
    /// 每批提交的选课号码数量
    pub batch_size: usize,
    /// 网络错误时每批最多尝试次数
    pub max_attempts: usize,
    /// 发现名额后是否立即加选
    pub auto_enroll: bool,
    // --- 问卷 ---
    /// 是否自动填写未完成的期末问卷
    pub fill_questionnaires: bool,
    pub filling_policy: FillingPolicy,
    // --- 日志 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            user_agent: USER_AGENT.to_string(),
            portal_base_url: PORTAL_BASE.to_string(),
            acad_base_url: ACAD_BASE.to_string(),
            request_timeout_secs: 30,
            monitor_codes: Vec::new(),
            batch_size: 10,
            max_attempts: 5,
            auto_enroll: false,
            fill_questionnaires: false,
            filling_policy: FillingPolicy::Great,
            verbose_logging: false,
            output_log_file: "monitor_log.txt".to_string(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"******")
            .field("portal_base_url", &self.portal_base_url)
            .field("acad_base_url", &self.acad_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("monitor_codes", &self.monitor_codes)
            .field("batch_size", &self.batch_size)
            .field("max_attempts", &self.max_attempts)
            .field("auto_enroll", &self.auto_enroll)
            .field("fill_questionnaires", &self.fill_questionnaires)
            .field("filling_policy", &self.filling_policy)
            .field("verbose_logging", &self.verbose_logging)
            .field("output_log_file", &self.output_log_file)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            username: std::env::var("NCHU_USERNAME").unwrap_or(default.username),
            password: std::env::var("NCHU_PASSWORD").unwrap_or(default.password),
            user_agent: std::env::var("USER_AGENT").unwrap_or(default.user_agent),
            portal_base_url: std::env::var("PORTAL_BASE_URL").unwrap_or(default.portal_base_url),
            acad_base_url: std::env::var("ACAD_BASE_URL").unwrap_or(default.acad_base_url),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            monitor_codes: std::env::var("MONITOR_CODES").ok().map(|v| parse_codes(&v)).unwrap_or(default.monitor_codes),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_size),
            max_attempts: std::env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            auto_enroll: std::env::var("AUTO_ENROLL").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auto_enroll),
            fill_questionnaires: std::env::var("FILL_QUESTIONNAIRES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.fill_questionnaires),
            filling_policy: std::env::var("FILLING_POLICY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.filling_policy),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// 检查必填项
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::Config("学号不能为空".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::Config("密码不能为空".to_string()));
        }
        if self.batch_size == 0 {
            return Err(AppError::Config("batch_size 必须大于 0".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(AppError::Config("max_attempts 必须大于 0".to_string()));
        }
        Ok(())
    }

    pub fn credential(&self) -> Credential {
        Credential::new(self.username.clone(), self.password.clone())
    }

    pub fn portal_urls(&self) -> PortalUrls {
        PortalUrls::new(self.portal_base_url.clone(), self.acad_base_url.clone())
    }
}

/// 解析逗号或空白分隔的选课号码
fn parse_codes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_partial_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            username = "4108056001"
            password = "pw"
            monitor_codes = ["0348", "1159"]
            filling_policy = "neutral"
            "#,
        )
        .unwrap();
        assert_eq!(config.monitor_codes, vec!["0348", "1159"]);
        assert_eq!(config.filling_policy, FillingPolicy::Neutral);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.acad_base_url, ACAD_BASE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config {
            password: "topsecret".into(),
            ..Config::default()
        };
        assert!(!format!("{:?}", config).contains("topsecret"));
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(parse_codes("0348, 0349 1159,,"), vec!["0348", "0349", "1159"]);
    }
}
