//! 流程步骤
//!
//! 一个步骤 = 一次请求 + 页面标记校验。抽取由调用方在拿到页面后完成。

use crate::error::Result;
use crate::infrastructure::{HttpPage, Transport};
use crate::models::{Endpoint, FormData};
use crate::services::Session;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// 请求目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 教务系统固定端点
    Acad(Endpoint),
    /// 从上一页抓到的完整地址
    Url(String),
}

/// 页面校验规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Contains(String),
    Absent(String),
}

/// 流程中的单个请求步骤
#[derive(Debug, Clone)]
pub struct Step {
    name: &'static str,
    method: Method,
    target: Target,
    checks: Vec<Check>,
}

impl Step {
    pub fn new(name: &'static str, method: Method, target: Target) -> Self {
        Self {
            name,
            method,
            target,
            checks: Vec::new(),
        }
    }

    pub fn get(name: &'static str, endpoint: Endpoint) -> Self {
        Self::new(name, Method::Get, Target::Acad(endpoint))
    }

    pub fn post(name: &'static str, endpoint: Endpoint) -> Self {
        Self::new(name, Method::Post, Target::Acad(endpoint))
    }

    /// 页面必须包含 `marker`
    pub fn expect(mut self, marker: impl Into<String>) -> Self {
        self.checks.push(Check::Contains(marker.into()));
        self
    }

    /// 页面必须包含全部 `markers`
    pub fn expect_all<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks
            .extend(markers.into_iter().map(|m| Check::Contains(m.into())));
        self
    }

    /// 页面不得包含 `marker`
    pub fn reject(mut self, marker: impl Into<String>) -> Self {
        self.checks.push(Check::Absent(marker.into()));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// 发送请求并校验页面
    pub async fn run<T: Transport>(&self, session: &Session<T>, form: &FormData) -> Result<HttpPage> {
        let url = match &self.target {
            Target::Acad(endpoint) => session.urls().acad(*endpoint)?,
            Target::Url(url) => url.clone(),
        };
        let page = match self.method {
            Method::Get => session.get(&url).await?,
            Method::Post => session.post_form(&url, form).await?,
        };
        page.ensure_success()?;
        for check in &self.checks {
            match check {
                Check::Contains(marker) => page.ensure_contains(self.name, marker)?,
                Check::Absent(marker) => page.ensure_absent(self.name, marker)?,
            }
        }
        debug!("[步骤 {}] 请求成功", self.name);
        Ok(page)
    }
}
