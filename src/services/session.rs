//! 会话服务 - 业务能力层
//!
//! 负责两段式登录：
//! 1. 校园入口 → 身份认证中心（SSO）
//! 2. 教务系统重新认证（按需，Cookie 缺失时才执行）

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::infrastructure::{HttpPage, ReqwestTransport, Transport};
use crate::models::endpoints::join_url;
use crate::models::markers::{ACAD_FRAMESET, SSO_LOGIN_FAILED_EN, SSO_LOGIN_FAILED_ZH};
use crate::models::{Credential, Endpoint, FormData, PortalUrls};
use crate::services::extractor;
use std::fmt;
use tracing::{debug, info};

/// SSO 登录表单中的账号字段
const SSO_USER_FIELD: &str = "Ecom_User_ID";
/// SSO 登录表单中的密码字段
const SSO_PASSWORD_FIELD: &str = "Ecom_Password";

/// 已认证的门户会话
///
/// 独占持有 Cookie 罐；同一会话上的流程通过 `&mut Session` 串行执行。
pub struct Session<T: Transport = ReqwestTransport> {
    transport: T,
    credential: Credential,
    urls: PortalUrls,
    academic_logins: usize,
}

/// 不输出传输层；凭据按 [`Credential`] 的格式隐藏密码
impl<T: Transport> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credential", &self.credential)
            .field("urls", &self.urls)
            .field("academic_logins", &self.academic_logins)
            .finish_non_exhaustive()
    }
}

impl Session<ReqwestTransport> {
    /// 按配置创建 HTTP 客户端并完成 SSO 登录
    pub async fn connect(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Self::authenticate(transport, config.credential(), config.portal_urls()).await
    }
}

impl<T: Transport> Session<T> {
    /// 完成 SSO 登录
    ///
    /// 密码错误返回 [`AppError::Auth`]，与网络错误区分，调用方不应重试。
    pub async fn authenticate(transport: T, credential: Credential, urls: PortalUrls) -> Result<Self> {
        info!("用户 <{}> 已创建", credential.username());
        let session = Self {
            transport,
            credential,
            urls,
            academic_logins: 0,
        };
        session.login_sso().await?;
        info!("用户 <{}> 已登录 SSO", session.username());
        Ok(session)
    }

    async fn login_sso(&self) -> Result<()> {
        // 入口首页中的表单指向 SSO 登录页
        let portal = self.transport.get(&self.urls.portal_base).await?;
        portal.ensure_success()?;
        let (entry_action, _) = extractor::first_form_action(&portal.body)?;
        let sso_entry_url = join_url(&portal.url, &entry_action)?;
        debug!("SSO 入口地址: {}", sso_entry_url);

        let sso_entry = self
            .transport
            .post_form(&sso_entry_url, &FormData::new())
            .await?;
        sso_entry.ensure_success()?;
        let (login_action, mut form) = extractor::first_form_action(&sso_entry.body)?;
        let sso_login_url = join_url(&sso_entry.url, &login_action)?;
        debug!("SSO 登录地址: {}", sso_login_url);
        debug!("SSO 登录隐藏字段: {:?}", form.pairs());

        form.set(SSO_USER_FIELD, self.credential.username());
        form.set(SSO_PASSWORD_FIELD, self.credential.password());

        let login = self.transport.post_form(&sso_login_url, &form).await?;
        login.ensure_success()?;
        if login.body.contains(SSO_LOGIN_FAILED_EN) || login.body.contains(SSO_LOGIN_FAILED_ZH) {
            return Err(AppError::auth("incorrect credential"));
        }
        Ok(())
    }

    /// 确保教务系统会话存在
    ///
    /// 已有教务系统 Cookie 时不发任何请求；否则执行第二段登录。
    pub async fn ensure_academic_session(&mut self) -> Result<()> {
        if self.transport.has_cookies_for(&self.urls.acad_base) {
            debug!("教务系统 Cookie 已存在，跳过登录");
            return Ok(());
        }
        self.login_academic().await
    }

    /// 教务系统登录，并通过侧边栏中的学号确认身份
    pub async fn login_academic(&mut self) -> Result<()> {
        let mut form = FormData::new();
        form.push("v_emp", self.credential.username())
            .push("v_pwd", self.credential.password())
            .push("v_lang", "chn");

        let login = self
            .transport
            .post_form(&self.urls.acad(Endpoint::Login)?, &form)
            .await?;
        login.ensure_success()?;
        login.ensure_contains("acad_login", ACAD_FRAMESET)?;
        debug!("教务系统登录请求成功");

        let sidebar = self.transport.get(&self.urls.acad(Endpoint::Sidebar)?).await?;
        sidebar.ensure_success()?;
        sidebar.ensure_contains("acad_sidebar", self.credential.username())?;
        debug!("教务系统侧边栏校验成功");

        self.academic_logins += 1;
        info!("用户 <{}> 已登录教务系统", self.username());
        Ok(())
    }

    pub fn username(&self) -> &str {
        self.credential.username()
    }

    pub fn urls(&self) -> &PortalUrls {
        &self.urls
    }

    /// 第二段登录实际执行的次数
    pub fn academic_login_count(&self) -> usize {
        self.academic_logins
    }

    pub(crate) async fn get(&self, url: &str) -> Result<HttpPage> {
        self.transport.get(url).await
    }

    pub(crate) async fn post_form(&self, url: &str, form: &FormData) -> Result<HttpPage> {
        self.transport.post_form(url, form).await
    }
}
