//! 教务系统固定端点表
//!
//! 路径由远端 PL/SQL 系统决定，必须逐字保留。

use crate::error::{AppError, Result};
use reqwest::Url;

/// 校园入口首页（用于获取 SSO 登录地址）
pub const PORTAL_BASE: &str = "https://portal.nchu.edu.tw";

/// 教务系统主机
pub const ACAD_BASE: &str = "https://onepiece2-sso.nchu.edu.tw";

/// 固定浏览器标识
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_1_0) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.141 Safari/537.36";

/// 教务系统端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Home,
    Login,
    Sidebar,
    GeEntry,
    GeSelect,
    GeList,
    GeCheck,
    GeFinal,
    DeptList,
    DeptCheck,
    DeptFinal,
    DirectList,
    DirectCheck,
    DirectFinal,
    DeleteList,
    DeleteCheck,
    DeleteFinal,
    QuesList,
    QuesConfirm,
    QuesFinal,
    QuesTaList,
    QuesTaFill,
    QuesTaSend,
}

impl Endpoint {
    /// 端点相对路径
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Home => "cofsys/plsql/acad_home",
            Endpoint::Login => "cofsys/plsql/ACAD_PASSCHK",
            Endpoint::Sidebar => "cofsys/plsql/studframe_left",
            Endpoint::GeEntry => "cofsys/plsql/gned_main",
            Endpoint::GeSelect => "cofsys/plsql/gned_add1_workflow",
            Endpoint::GeList => "cofsys/plsql/gned_add2_list",
            Endpoint::GeCheck => "cofsys/plsql/gned_add3_check",
            Endpoint::GeFinal => "cofsys/plsql/gned_add4_dml",
            Endpoint::DeptList => "cofsys/plsql/enro_nomo1_list",
            Endpoint::DeptCheck => "cofsys/plsql/enro_nomo2_check",
            Endpoint::DeptFinal => "cofsys/plsql/enro_nomo3_dml",
            Endpoint::DirectList => "cofsys/plsql/enro_direct1_list",
            Endpoint::DirectCheck => "cofsys/plsql/enro_direct2_chk",
            Endpoint::DirectFinal => "cofsys/plsql/enro_direct3_dml",
            Endpoint::DeleteList => "cofsys/plsql/enro_del1_list",
            Endpoint::DeleteCheck => "cofsys/plsql/enro_del2_check",
            Endpoint::DeleteFinal => "cofsys/plsql/enro_del3_drop",
            Endpoint::QuesList => "cofsys/plsql/Stud_Question_Main1",
            Endpoint::QuesConfirm => "cofsys/plsql/Stud_Question_Conf3",
            Endpoint::QuesFinal => "cofsys/plsql/Stud_Question_Dml4",
            Endpoint::QuesTaList => "cofsys/plsql/ta_ques_stu",
            Endpoint::QuesTaFill => "cofsys/plsql/ta_ques_stu_des",
            Endpoint::QuesTaSend => "cofsys/plsql/ta_ques_stu_des_udt",
        }
    }

    /// 拼接为完整 URL
    pub fn url(self, base: &str) -> Result<String> {
        join_url(base, self.path())
    }
}

/// 按浏览器规则把相对地址拼接到基准地址上
pub fn join_url(base: &str, relative: &str) -> Result<String> {
    let base = Url::parse(base).map_err(|e| AppError::parse(format!("无效的基准地址 {}: {}", base, e)))?;
    let joined = base
        .join(relative)
        .map_err(|e| AppError::parse(format!("无法拼接地址 {}: {}", relative, e)))?;
    Ok(joined.to_string())
}

/// 会话所需的两个主机地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalUrls {
    pub portal_base: String,
    pub acad_base: String,
}

impl PortalUrls {
    pub fn new(portal_base: impl Into<String>, acad_base: impl Into<String>) -> Self {
        Self {
            portal_base: portal_base.into(),
            acad_base: acad_base.into(),
        }
    }

    /// 教务系统端点的完整 URL
    pub fn acad(&self, endpoint: Endpoint) -> Result<String> {
        endpoint.url(&self.acad_base)
    }
}

impl Default for PortalUrls {
    fn default() -> Self {
        Self::new(PORTAL_BASE, ACAD_BASE)
    }
}
