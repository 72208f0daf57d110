//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、初始化日志文件、登录 SSO
//! 2. **一轮监控**：对 `monitor_codes` 执行一次 [`Monitor::poll_cycle`]
//! 3. **问卷填写**：按配置填写未完成的期末问卷
//! 4. **统计输出**：打印本轮统计并写入日志文件
//!
//! 只运行一轮；轮询间隔和常驻由外部调度（cron 等）负责。

use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::monitor::{CycleReport, Monitor};
use crate::services::{LogNotifier, Session};
use crate::utils::logging::{append_log_line, init_log_file, log_startup, print_cycle_stats};
use crate::workflow::QuestionnaireFlow;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    session: Session,
    monitor: Monitor,
    questionnaires: QuestionnaireFlow,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config.username, config.monitor_codes.len());

        let session = Session::connect(&config).await?;
        let monitor = Monitor::new(&config);
        let questionnaires = QuestionnaireFlow::new(&config);

        Ok(Self {
            config,
            session,
            monitor,
            questionnaires,
        })
    }

    /// 运行一轮
    pub async fn run(mut self) -> Result<CycleReport> {
        let report = self
            .monitor
            .poll_cycle(&mut self.session, &self.config.monitor_codes, &LogNotifier)
            .await?;

        if self.config.fill_questionnaires {
            self.fill_questionnaires().await?;
        }

        print_cycle_stats(
            report.checked,
            report.vacancies.len(),
            report.enrolled.len(),
            report.failures.len(),
        );
        self.write_report(&report)?;
        info!("\n日志已保存至: {}", self.config.output_log_file);

        Ok(report)
    }

    async fn fill_questionnaires(&mut self) -> Result<()> {
        info!("\n📝 开始填写期末问卷（策略: {:?}）", self.questionnaires.policy());
        let results = self.questionnaires.fill_pending(&mut self.session).await?;
        if results.is_empty() {
            info!("没有需要填写的问卷");
        }
        for (course, outcome) in &results {
            if !outcome.is_success() {
                warn!("问卷 {} 未保存: {}", course, outcome.message().unwrap_or(""));
            }
        }
        Ok(())
    }

    fn write_report(&self, report: &CycleReport) -> Result<()> {
        let line = serde_json::to_string(report)?;
        append_log_line(&self.config.output_log_file, &line)
    }
}
