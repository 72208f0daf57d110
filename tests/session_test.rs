mod common;

use common::*;
use nchu_portal::models::{Credential, Endpoint};
use nchu_portal::{AppError, Session};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_sso_login_posts_credentials_with_hidden_fields() {
    let fake = FakeTransport::new();
    let session = session(&fake).await;
    assert_eq!(session.username(), USERNAME);
    assert_eq!(session.academic_login_count(), 0);

    let login = fake.requests_to(SSO_LOGIN);
    assert_eq!(login.len(), 1);
    let form = &login[0].form;
    assert_eq!(form.get("target"), Some("https://portal.test/"));
    assert_eq!(form.get("Ecom_User_ID"), Some(USERNAME));
    assert_eq!(form.get("Ecom_Password"), Some("secret"));

    // SSO 入口通过首页表单的相对 action 找到
    assert_eq!(fake.requests_to(SSO_ENTRY).len(), 1);
}

#[tokio::test]
async fn test_wrong_password_is_auth_error() {
    let fake = FakeTransport::new();
    script_sso(&fake, false);
    let result =
        Session::authenticate(fake.clone(), Credential::new(USERNAME, "wrong"), urls()).await;
    let err = assert_err!(result);
    assert!(err.is_auth());
    assert!(!err.is_retryable());
    assert!(matches!(err, AppError::Auth { .. }));
}

#[tokio::test]
async fn test_chinese_login_failure_is_auth_error() {
    let fake = FakeTransport::new();
    script_sso(&fake, true);
    fake.respond(SSO_LOGIN, "<html>登入失敗</html>");
    // 第一个排队的回应是成功页，先消费掉
    fake.respond(SSO_LOGIN, "<html>登入失敗</html>");
    let first =
        Session::authenticate(fake.clone(), Credential::new(USERNAME, "secret"), urls()).await;
    assert_ok!(first);
    let second =
        Session::authenticate(fake.clone(), Credential::new(USERNAME, "wrong"), urls()).await;
    assert!(assert_err!(second).is_auth());
}

#[tokio::test]
async fn test_portal_outage_is_http_status_error() {
    let fake = FakeTransport::new();
    fake.respond_status(PORTAL, 503, "Service Unavailable");
    let result =
        Session::authenticate(fake.clone(), Credential::new(USERNAME, "secret"), urls()).await;
    let err = assert_err!(result);
    assert!(matches!(err, AppError::HttpStatus { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_academic_login_runs_once() {
    let fake = FakeTransport::new();
    let mut session = session(&fake).await;

    assert_ok!(session.ensure_academic_session().await);
    assert_ok!(session.ensure_academic_session().await);

    assert_eq!(session.academic_login_count(), 1);
    let logins = fake.requests_to_acad(Endpoint::Login);
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].form.get("v_emp"), Some(USERNAME));
    assert_eq!(logins[0].form.get("v_lang"), Some("chn"));
    assert_eq!(fake.requests_to_acad(Endpoint::Sidebar).len(), 1);
}

#[tokio::test]
async fn test_academic_login_without_frameset_is_workflow_error() {
    let fake = FakeTransport::new();
    script_sso(&fake, true);
    fake.respond_acad(Endpoint::Login, "<html>帳號或密碼錯誤</html>");
    let mut session =
        Session::authenticate(fake.clone(), Credential::new(USERNAME, "secret"), urls())
            .await
            .unwrap();

    let err = assert_err!(session.ensure_academic_session().await);
    assert!(matches!(err, AppError::Workflow { ref step, .. } if step == "acad_login"));
    assert_eq!(session.academic_login_count(), 0);
}

#[tokio::test]
async fn test_debug_output_hides_password() {
    let fake = FakeTransport::new();
    let session = session(&fake).await;
    let printed = format!("{:?}", session);
    assert!(printed.contains(USERNAME));
    assert!(!printed.contains("secret"));
}
