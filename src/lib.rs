//! # NCHU Portal
//!
//! 中兴大学校园入口与教务系统的会话 / 选课 / 问卷自动化
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端和 Cookie 罐，只暴露能力
//! - `Transport` - GET / 表单 POST / Cookie 查询
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `Session` - SSO 登录和教务系统二次认证
//! - `extractor` - 按固定表格 / 列位置抽取页面数据
//! - `Notifier` - 通知能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一个业务流程的完整请求顺序
//! - `CourseFlow` - 加选（通识 / 系所 / 选课号码）、退选、名额查询
//! - `QuestionnaireFlow` - 期末问卷和 TA 问卷
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/monitor` - 分批监控名额
//! - `orchestrator/app` - 一轮完整运行
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, Result};
pub use infrastructure::{HttpPage, ReqwestTransport, Transport};
pub use models::{CourseResult, Outcome, SeatStatus};
pub use orchestrator::{App, CycleReport, Monitor};
pub use services::{LogNotifier, Notifier, Session};
pub use workflow::{CourseFlow, QuestionnaireFlow};
