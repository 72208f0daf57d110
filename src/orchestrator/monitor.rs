//! 名额监控 - 编排层
//!
//! ## 职责
//!
//! 对一组选课号码执行一轮名额查询：
//!
//! 1. **分批**：每批最多 `batch_size` 个号码，一次确认页查询
//! 2. **重试**：网络 / HTTP 状态错误最多尝试 `max_attempts` 次，不退避
//! 3. **通知**：每个有名额的号码本轮只通知一次
//! 4. **自动加选**：开启 `auto_enroll` 时立即加选有名额的号码
//!
//! 认证错误直接中止本轮，其余错误只记为本批失败。

use crate::config::Config;
use crate::error::Result;
use crate::infrastructure::Transport;
use crate::models::SeatStatus;
use crate::services::{Notifier, Session};
use crate::utils::logging::log_batch_start;
use crate::workflow::CourseFlow;
use serde::Serialize;
use tracing::{error, info, warn};

/// 一轮监控的统计
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// 成功查到名额的号码数
    pub checked: usize,
    /// 有名额的号码
    pub vacancies: Vec<String>,
    /// 自动加选成功的号码
    pub enrolled: Vec<String>,
    /// 查询或加选失败的号码
    pub failures: Vec<String>,
}

/// 名额监控器
#[derive(Debug)]
pub struct Monitor {
    flow: CourseFlow,
    batch_size: usize,
    max_attempts: usize,
    auto_enroll: bool,
}

impl Monitor {
    pub fn new(config: &Config) -> Self {
        Self {
            flow: CourseFlow::new(config),
            batch_size: config.batch_size.max(1),
            max_attempts: config.max_attempts.max(1),
            auto_enroll: config.auto_enroll,
        }
    }

    /// 执行一轮监控
    pub async fn poll_cycle<T, N>(
        &self,
        session: &mut Session<T>,
        codes: &[String],
        notifier: &N,
    ) -> Result<CycleReport>
    where
        T: Transport,
        N: Notifier + ?Sized,
    {
        let mut report = CycleReport::default();
        if codes.is_empty() {
            warn!("⚠️ 没有需要监控的选课号码");
            return Ok(report);
        }

        let total_batches = codes.len().div_ceil(self.batch_size);
        for (index, batch) in codes.chunks(self.batch_size).enumerate() {
            log_batch_start(index + 1, total_batches, batch);

            let seats = match self.check_with_retry(session, batch).await {
                Ok(seats) => seats,
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    error!("[批次 {}] ❌ 名额查询失败: {}", index + 1, e);
                    report.failures.extend(batch.iter().cloned());
                    continue;
                }
            };
            report.checked += seats.len();

            let vacant: Vec<String> = seats
                .iter()
                .filter(|s| s.has_vacancy())
                .map(|s| s.code.clone())
                .collect();
            for status in seats.iter().filter(|s| s.has_vacancy()) {
                notifier.notify(&vacancy_message(status));
            }
            report.vacancies.extend(vacant.iter().cloned());

            if self.auto_enroll && !vacant.is_empty() {
                self.enroll(session, &vacant, notifier, &mut report).await?;
            }
        }

        info!(
            "本轮监控结束: 查询 {} 个, 有名额 {} 个",
            report.checked,
            report.vacancies.len()
        );
        Ok(report)
    }

    async fn check_with_retry<T: Transport>(
        &self,
        session: &mut Session<T>,
        batch: &[String],
    ) -> Result<Vec<SeatStatus>> {
        let mut attempt = 1;
        loop {
            match self.flow.check_seats(session, batch).await {
                Ok(seats) => return Ok(seats),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        "名额查询失败（第 {}/{} 次）: {}，立即重试",
                        attempt, self.max_attempts, e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn enroll<T, N>(
        &self,
        session: &mut Session<T>,
        vacant: &[String],
        notifier: &N,
        report: &mut CycleReport,
    ) -> Result<()>
    where
        T: Transport,
        N: Notifier + ?Sized,
    {
        match self.flow.add_with_codes(session, vacant).await {
            Ok(results) => {
                for result in results {
                    if result.outcome.is_success() {
                        notifier.notify(&format!("✅ 已加选 {}", result.code));
                        report.enrolled.push(result.code);
                    } else {
                        report.failures.push(result.code);
                    }
                }
                Ok(())
            }
            Err(e) if e.is_auth() => Err(e),
            Err(e) => {
                error!("自动加选失败: {}", e);
                report.failures.extend(vacant.iter().cloned());
                Ok(())
            }
        }
    }
}

fn vacancy_message(status: &SeatStatus) -> String {
    format!(
        "课程 {} 有名额: 可选 {} / 已选 {}",
        status.code, status.available, status.selected
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_zero_sizes() {
        let config = Config {
            batch_size: 0,
            max_attempts: 0,
            ..Config::default()
        };
        let monitor = Monitor::new(&config);
        assert_eq!(monitor.batch_size, 1);
        assert_eq!(monitor.max_attempts, 1);
    }

    #[test]
    fn test_vacancy_message() {
        let status = SeatStatus {
            code: "1159".into(),
            available: 5,
            selected: 2,
        };
        assert_eq!(vacancy_message(&status), "课程 1159 有名额: 可选 5 / 已选 2");
    }
}
