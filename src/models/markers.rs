//! 页面标记文字
//!
//! 远端系统没有结构化状态码，成功与否完全依赖以下字面量在页面中是否出现。

/// SSO 登录失败（英文界面）
pub const SSO_LOGIN_FAILED_EN: &str = "Login failed";
/// SSO 登录失败（中文界面）
pub const SSO_LOGIN_FAILED_ZH: &str = "登入失敗";

/// 教务系统登录后的框架页
pub const ACAD_FRAMESET: &str = "FRAMESET";

/// 通识选课入口
pub const GE_ENTRY: &str = "選課狀態";
/// 通识课程列表
pub const GE_LIST: &str = "通識課程一覽表";
/// 当前时段未开放
pub const NOT_OPEN: &str = "本時段不開放此功能";

/// 系所必选修加选页
pub const DEPT_LIST: &str = "系所必選修課程加選";
/// 选课号码加选页
pub const DIRECT_LIST: &str = "選課號碼加選";
/// 退选页
pub const DELETE_LIST: &str = "課程退選";

/// 加选成功
pub const ADD_SUCCESS: &str = "加選成功";
/// 退选成功
pub const DROP_SUCCESS: &str = "退選成功";

/// 期末教学意见调查列表
pub const QUES_LIST: &str = "期末教學意見調查";
/// 问卷保存完成
pub const QUES_SAVED: &str = "儲存完成";
/// TA 服务意见调查列表
pub const QUES_TA_LIST: &str = "學生TA服務意見調查";
/// 已填写
pub const FILLED: &str = "已填寫";

/// 问卷列表中的课程名称表头
pub const HEADER_COURSE_NAME: &str = "課程名稱";
