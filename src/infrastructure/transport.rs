//! HTTP 传输层 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端与 Cookie 罐，只暴露"发请求"的能力

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::FormData;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::{Client, Url};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

/// 调试日志中需要隐藏的表单字段
const SECRET_FIELDS: &[&str] = &["Ecom_Password", "v_pwd"];

/// 一次请求的响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpPage {
    /// 跟随重定向后的最终地址
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl HttpPage {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// 状态码必须为 2xx
    pub fn ensure_success(&self) -> Result<()> {
        if (200..300).contains(&self.status) {
            Ok(())
        } else {
            Err(AppError::HttpStatus {
                url: self.url.clone(),
                status: self.status,
            })
        }
    }

    /// 页面必须包含 `marker`
    pub fn ensure_contains(&self, step: &str, marker: &str) -> Result<()> {
        if self.body.contains(marker) {
            Ok(())
        } else {
            Err(AppError::workflow(step, format!("页面缺少标记「{}」", marker)))
        }
    }

    /// 页面不得包含 `marker`
    pub fn ensure_absent(&self, step: &str, marker: &str) -> Result<()> {
        if self.body.contains(marker) {
            Err(AppError::workflow(step, format!("页面出现标记「{}」", marker)))
        } else {
            Ok(())
        }
    }
}

/// HTTP 传输能力
///
/// 职责：
/// - 持有 Cookie 与请求头
/// - 不认识课程 / 问卷
/// - 不校验页面内容
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// GET 请求
    async fn get(&self, url: &str) -> Result<HttpPage>;

    /// 以 `application/x-www-form-urlencoded` 提交表单
    async fn post_form(&self, url: &str, form: &FormData) -> Result<HttpPage>;

    /// Cookie 罐中是否已有发往 `url` 的 Cookie
    fn has_cookies_for(&self, url: &str) -> bool;
}

/// 记录 Cookie 所属域名的 Cookie 罐
///
/// SSO 下发的 `Domain=.nchu.edu.tw` Cookie 也会随请求发往教务系统，
/// 只看 `Jar::cookies` 无法分辨教务系统自己的会话是否已建立。
/// 因此每条 `Set-Cookie` 都按其 `Domain` 属性（缺省为响应主机）登记，
/// 判断时只认与目标主机完全相同的域名，不看 `Path`。
#[derive(Debug, Default)]
struct DomainJar {
    jar: Jar,
    domains: RwLock<HashSet<String>>,
}

impl DomainJar {
    fn has_domain(&self, host: &str) -> bool {
        self.domains
            .read()
            .map(|domains| domains.contains(&host.to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

impl CookieStore for DomainJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        if let Some(host) = url.host_str() {
            if let Ok(mut domains) = self.domains.write() {
                for value in &headers {
                    if let Ok(raw) = value.to_str() {
                        domains.insert(cookie_domain(raw, host));
                    }
                }
            }
        }
        self.jar.set_cookies(&mut headers.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

/// `Set-Cookie` 的作用域名：`Domain` 属性去掉前导点，缺省为响应主机
fn cookie_domain(set_cookie: &str, host: &str) -> String {
    set_cookie
        .split(';')
        .skip(1)
        .filter_map(|attr| {
            let (name, value) = attr.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("domain")
                .then(|| value.trim().trim_start_matches('.'))
        })
        .find(|domain| !domain.is_empty())
        .unwrap_or(host)
        .to_ascii_lowercase()
}

/// 基于 reqwest 的传输实现
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    jar: Arc<DomainJar>,
}

impl ReqwestTransport {
    /// 创建新的传输实例
    pub fn new(config: &Config) -> Result<Self> {
        let jar = Arc::new(DomainJar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, jar })
    }

    async fn read_page(response: reqwest::Response) -> Result<HttpPage> {
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport(url.clone(), e))?;
        debug!("响应 {} {} ({} 字节)", status, url, body.len());
        Ok(HttpPage { url, status, body })
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpPage> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::transport(url, e))?;
        Self::read_page(response).await
    }

    async fn post_form(&self, url: &str, form: &FormData) -> Result<HttpPage> {
        debug!("POST {} {:?}", url, form.redacted(SECRET_FIELDS));
        let response = self
            .client
            .post(url)
            .form(form.pairs())
            .send()
            .await
            .map_err(|e| AppError::transport(url, e))?;
        Self::read_page(response).await
    }

    fn has_cookies_for(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|url| url.host_str().map(|host| self.jar.has_domain(host)))
            .unwrap_or(false)
    }
}
