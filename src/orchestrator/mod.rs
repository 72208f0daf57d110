//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `monitor` - 名额监控
//! - 按 `batch_size` 分批查询选课号码的名额
//! - 网络错误重试，认证错误中止
//! - 有名额时通知，可选自动加选
//!
//! ### `app` - 应用入口
//! - 校验配置、初始化日志、登录
//! - 执行一轮监控和问卷填写，输出统计
//!
//! ## 层次关系
//!
//! ```text
//! app (一轮运行)
//!     ↓
//! monitor (Vec<选课号码>)
//!     ↓
//! workflow::CourseFlow / QuestionnaireFlow (单个流程)
//!     ↓
//! services (Session / extractor / notifier)
//!     ↓
//! infrastructure (Transport)
//! ```
//!
//! 本层只做调度和统计，不解析页面。

pub mod app;
pub mod monitor;

pub use app::App;
pub use monitor::{CycleReport, Monitor};
