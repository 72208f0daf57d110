//! 集成测试公用工具：按 URL 回放页面的假传输层和页面构造函数

#![allow(dead_code)]

use nchu_portal::models::{Credential, Endpoint, FormData, PortalUrls};
use nchu_portal::{AppError, HttpPage, Result, Session, Transport};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

pub const PORTAL: &str = "https://portal.test/";
pub const ACAD: &str = "https://acad.test";
pub const SSO_ENTRY: &str = "https://portal.test/nidp/sso?id=1";
pub const SSO_LOGIN: &str = "https://idp.test/nidp/login";
pub const USERNAME: &str = "4107000001";

/// 记录下来的一次请求
#[derive(Debug, Clone)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub form: FormData,
}

#[derive(Default)]
struct State {
    routes: HashMap<String, VecDeque<HttpPage>>,
    requests: Vec<Request>,
    expired: HashSet<String>,
    acad_cookie: bool,
}

/// 假传输层
///
/// 同一 URL 的多个回应按顺序返回，最后一个会一直重复；
/// 向教务系统登录端点 POST 后视为已取得教务 Cookie。
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: impl Into<String>) -> &Self {
        self.respond_status(url, 200, body)
    }

    pub fn respond_status(&self, url: &str, status: u16, body: impl Into<String>) -> &Self {
        let mut state = self.state.lock().unwrap();
        state
            .routes
            .entry(url.to_string())
            .or_default()
            .push_back(HttpPage::new(url, status, body));
        self
    }

    pub fn respond_acad(&self, endpoint: Endpoint, body: impl Into<String>) -> &Self {
        self.respond(&acad_url(endpoint), body)
    }

    /// 之后发往 `url` 的请求都返回认证错误
    pub fn expire(&self, url: &str) -> &Self {
        self.state.lock().unwrap().expired.insert(url.to_string());
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    /// 发往某个 URL 的请求
    pub fn requests_to(&self, url: &str) -> Vec<Request> {
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }

    pub fn requests_to_acad(&self, endpoint: Endpoint) -> Vec<Request> {
        self.requests_to(&acad_url(endpoint))
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    fn reply(&self, method: &'static str, url: &str, form: &FormData) -> Result<HttpPage> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Request {
            method,
            url: url.to_string(),
            form: form.clone(),
        });
        if state.expired.contains(url) {
            return Err(AppError::auth("session expired"));
        }
        if method == "POST" && url == acad_url(Endpoint::Login) {
            state.acad_cookie = true;
        }
        Ok(match state.routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => HttpPage::new(url, 404, "Not Found"),
        })
    }
}

impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpPage> {
        self.reply("GET", url, &FormData::new())
    }

    async fn post_form(&self, url: &str, form: &FormData) -> Result<HttpPage> {
        self.reply("POST", url, form)
    }

    fn has_cookies_for(&self, url: &str) -> bool {
        url.starts_with(ACAD) && self.state.lock().unwrap().acad_cookie
    }
}

pub fn acad_url(endpoint: Endpoint) -> String {
    urls().acad(endpoint).unwrap()
}

pub fn urls() -> PortalUrls {
    PortalUrls::new(PORTAL, ACAD)
}

// ========== 登录脚本 ==========

/// 三段 SSO 页面；`accept` 为 false 时最后一页返回登录失败
pub fn script_sso(fake: &FakeTransport, accept: bool) {
    fake.respond(
        PORTAL,
        r#"<html><body><form name="IDPLogin" action="/nidp/sso?id=1" method="post"></form></body></html>"#,
    );
    fake.respond(
        SSO_ENTRY,
        format!(
            r#"<html><body><form action="{SSO_LOGIN}" method="post">
                <input type="hidden" name="target" value="https://portal.test/">
                <input type="text" name="Ecom_User_ID">
                <input type="password" name="Ecom_Password">
            </form></body></html>"#
        ),
    );
    let body = if accept {
        "<html><body>Welcome</body></html>"
    } else {
        "<html><body><font color=red>Login failed, please try again.</font></body></html>"
    };
    fake.respond(SSO_LOGIN, body);
}

/// 教务系统登录页和侧边栏
pub fn script_acad_login(fake: &FakeTransport) {
    fake.respond_acad(
        Endpoint::Login,
        "<HTML><FRAMESET cols=\"20%,80%\"><FRAME src=\"studframe_left\"></FRAMESET></HTML>",
    );
    fake.respond_acad(
        Endpoint::Sidebar,
        format!("<html><body>學號：{USERNAME}</body></html>"),
    );
}

/// 已完成 SSO 登录的会话（教务系统尚未登录）
pub async fn session(fake: &FakeTransport) -> Session<FakeTransport> {
    script_sso(fake, true);
    script_acad_login(fake);
    Session::authenticate(fake.clone(), Credential::new(USERNAME, "secret"), urls())
        .await
        .expect("SSO 登录应该成功")
}

// ========== 页面构造 ==========

/// 课程行：第 1 列勾选框（隐藏值），第 2 列选课号码，第 9/10 列名额
pub fn course_row(code: &str, token: &str, available: u32, selected: u32) -> String {
    format!(
        "<tr><td><input type=checkbox name=v_tick value=\"{token}\"></td><td>{code}</td>\
         <td>課程名稱{code}</td><td>3</td><td>必</td><td>甲</td><td>一234</td><td>教師</td>\
         <td>{available}</td><td>{selected}</td></tr>"
    )
}

const HEADER_ROW: &str = "<tr><th>選</th><th>號碼</th><th>名稱</th></tr>";

/// 课程表位于第 1 个表单
pub fn first_form_page(marker: &str, rows: &[String]) -> String {
    format!(
        "<html><body><h2>{marker}</h2><form method=post><table>{HEADER_ROW}{}</table></form></body></html>",
        rows.concat()
    )
}

/// 课程表位于第 2 个表单（第 1 个是查询表单）
pub fn second_form_page(marker: &str, rows: &[String]) -> String {
    format!(
        "<html><body><h2>{marker}</h2><form><input type=text name=v_query></form>\
         <form method=post><table>{HEADER_ROW}{}</table></form></body></html>",
        rows.concat()
    )
}

/// 单门课程结果页：消息位于第 `table_index + 1` 个表格的第 `cell_index + 1` 个单元格
pub fn final_page(table_index: usize, cell_index: usize, code: &str, message: &str) -> String {
    let fillers = "<table><tr><td>-</td></tr></table>".repeat(table_index);
    let cells: String = (0..cell_index)
        .map(|i| {
            if i == 1 {
                format!("<td>{code}</td>")
            } else {
                format!("<td>c{i}</td>")
            }
        })
        .collect();
    format!("<html><body>{fillers}<table><tr>{cells}<td>{message}</td></tr></table></body></html>")
}

/// 选课号码加选结果页：每门课程一行，第 8 列为消息，末行为说明
pub fn direct_final_page(results: &[(&str, &str)]) -> String {
    let rows: String = results
        .iter()
        .map(|(code, message)| {
            format!(
                "<tr><td>選</td><td>{code}</td><td>名稱</td><td>3</td><td>必</td>\
                 <td>甲</td><td>教師</td><td>{message}</td></tr>"
            )
        })
        .collect();
    format!(
        "<html><body><table>{rows}<tr><td colspan=8>請確認選課結果</td></tr></table></body></html>"
    )
}

/// 期末问卷列表：第 3 个表格，第 10 列为链接，第 11 列有图片表示已完成
pub fn questionnaire_list_page(rows: &[(&str, &str, Option<&str>, bool)]) -> String {
    let headers = [
        "序號", "選課號碼", "課程名稱", "學分", "必選", "班別", "教師", "開課系所", "狀態", "填寫",
        "完成",
    ];
    let header_row: String = headers.iter().map(|h| format!("<th>{h}</th>")).collect();
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, (code, name, link, done))| {
            let link = link
                .map(|href| format!("<a href=\"{href}\">填寫</a>"))
                .unwrap_or_default();
            let done = if *done { "<img src=\"ok.gif\">" } else { "" };
            format!(
                "<tr><td>{}</td><td>{code}</td><td>{name}</td><td>3</td><td>必</td><td>甲</td>\
                 <td>教師</td><td>資工系</td><td>開放</td><td>{link}</td><td>{done}</td></tr>",
                i + 1
            )
        })
        .collect();
    format!(
        "<html><body><table><tr><td>{}</td></tr></table><table><tr><td>說明</td></tr></table>\
         <table><tr>{header_row}</tr>{body}</table></body></html>",
        "期末教學意見調查"
    )
}

/// TA 问卷列表：第 3 个表格，第 8 列为每位 TA 的表单
pub fn ta_list_page(code: &str, ta_ids: &[&str]) -> String {
    let headers = ["序號", "選課號碼", "課程名稱", "學分", "必選", "班別", "教師", "TA"];
    let header_row: String = headers.iter().map(|h| format!("<th>{h}</th>")).collect();
    let forms: String = ta_ids
        .iter()
        .map(|ta| {
            format!(
                "<form action=ta_ques_stu_des method=post>\
                 <input type=hidden name=v_ta value=\"{ta}\">\
                 <input type=hidden name=v_crs value=\"{code}\">\
                 <input type=submit value=\"填寫\"></form>"
            )
        })
        .collect();
    format!(
        "<html><body><table><tr><td>學生TA服務意見調查</td></tr></table><table><tr><td>-</td></tr></table>\
         <table><tr>{header_row}</tr><tr><td>1</td><td>{code}</td><td>演算法</td><td>3</td>\
         <td>必</td><td>甲</td><td>教師</td><td>{forms}</td></tr></table></body></html>"
    )
}
