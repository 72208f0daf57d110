//! 选课流程 - 流程层
//!
//! 核心职责：定义加选 / 退选 / 名额查询的完整请求顺序
//!
//! 流程顺序（以选课号码加选为例）：
//! 1. 列表页（LIST）
//! 2. 提交选课号码，取回每行的隐藏字段（CONFIRM）
//! 3. 回传隐藏字段完成加选（FINAL）
//! 4. 按结果页文字判定 SUCCESS / REJECTED

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::infrastructure::{HttpPage, Transport};
use crate::models::markers::{
    ADD_SUCCESS, DELETE_LIST, DEPT_LIST, DIRECT_LIST, DROP_SUCCESS, GE_ENTRY, GE_LIST, NOT_OPEN,
};
use crate::models::{CourseRecord, CourseResult, Endpoint, FormData, Outcome, SeatStatus};
use crate::services::extractor::{self, FinalPage, FormRole};
use crate::services::Session;
use crate::workflow::state::{WorkflowRun, WorkflowState};
use crate::workflow::step::Step;
use tracing::{info, warn};

/// 选课流程
///
/// - 不持有会话，调用方传入 `&mut Session` 保证同一会话上的流程串行
/// - 业务拒绝作为 [`Outcome::Rejected`] 返回，不重试
#[derive(Debug, Default)]
pub struct CourseFlow {
    verbose_logging: bool,
}

impl CourseFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            verbose_logging: config.verbose_logging,
        }
    }

    /// 通识课程加选
    pub async fn add_from_ge<T: Transport>(
        &self,
        session: &mut Session<T>,
        code: &str,
    ) -> Result<CourseResult> {
        session.ensure_academic_session().await?;
        let mut run = WorkflowRun::start("ge_add");

        let list = self.open_ge_list(session).await?;
        run.advance(WorkflowState::List)?;

        let table = extractor::extract_table(&list.body, FormRole::Ge)?;
        let Some(token) = extractor::token_for_row(&table, code) else {
            return Ok(self.not_found(&run, code));
        };

        let mut form = FormData::new();
        form.push("v_click", token.as_str());
        let confirm = Step::post("ge_check", Endpoint::GeCheck)
            .expect(code)
            .run(session, &form)
            .await?;
        run.advance(WorkflowState::Confirm)?;

        // 确认页会换发新的 v_click
        let confirm_code = extractor::ge_confirm_code(&confirm.body)?;
        let mut form = FormData::new();
        form.push("v_click", confirm_code);
        let final_page = Step::post("ge_final", Endpoint::GeFinal)
            .expect(code)
            .run(session, &form)
            .await?;
        run.advance(WorkflowState::Final)?;

        let message = extractor::final_message(&final_page.body, FinalPage::Ge)?;
        self.conclude(&mut run, code, message, ADD_SUCCESS)
    }

    /// 系所必选修课程加选
    pub async fn add_from_dept<T: Transport>(
        &self,
        session: &mut Session<T>,
        code: &str,
    ) -> Result<CourseResult> {
        session.ensure_academic_session().await?;
        let mut run = WorkflowRun::start("dept_add");

        let list = Step::get("dept_list", Endpoint::DeptList)
            .expect(DEPT_LIST)
            .run(session, &FormData::new())
            .await?;
        run.advance(WorkflowState::List)?;

        let table = extractor::extract_table(&list.body, FormRole::Acad)?;
        let Some(token) = extractor::token_for_row(&table, code) else {
            return Ok(self.not_found(&run, code));
        };

        let mut form = FormData::new();
        form.push("v_tick", token.as_str());
        Step::post("dept_check", Endpoint::DeptCheck)
            .expect(code)
            .run(session, &form)
            .await?;
        run.advance(WorkflowState::Confirm)?;

        let mut form = FormData::new();
        form.push("p_stud_no", session.username())
            .push("v_tick", token.as_str());
        let final_page = Step::post("dept_final", Endpoint::DeptFinal)
            .expect(code)
            .run(session, &form)
            .await?;
        run.advance(WorkflowState::Final)?;

        let message = extractor::final_message(&final_page.body, FinalPage::Acad)?;
        self.conclude(&mut run, code, message, ADD_SUCCESS)
    }

    /// 按选课号码批量加选
    ///
    /// 结果顺序与 `codes` 一致；列表中找不到的号码为 [`Outcome::NotFound`]，不会提交。
    pub async fn add_with_codes<T: Transport>(
        &self,
        session: &mut Session<T>,
        codes: &[String],
    ) -> Result<Vec<CourseResult>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        session.ensure_academic_session().await?;
        let mut run = WorkflowRun::start("direct_add");
        info!("[工作流 {}] 尝试加选 <{}>", run.name(), codes.join(", "));

        let confirm = self.submit_codes(session, codes).await?;
        run.advance(WorkflowState::List)?;
        run.advance(WorkflowState::Confirm)?;

        let table = extractor::extract_table(&confirm.body, FormRole::Code)?;
        let mut form = FormData::new();
        let mut submitted = Vec::new();
        for code in codes {
            match extractor::token_for_row(&table, code) {
                Some(token) => {
                    form.push("v_tick", token.as_str());
                    submitted.push(code.clone());
                }
                None => warn!("[工作流 {}] 确认页中找不到课程 {}", run.name(), code),
            }
        }
        if submitted.is_empty() {
            return Ok(codes
                .iter()
                .map(|code| CourseResult::new(code.clone(), Outcome::NotFound))
                .collect());
        }
        form.push("p_stud_no", session.username());

        let final_page = Step::post("direct_final", Endpoint::DirectFinal)
            .expect_all(submitted.iter().cloned())
            .run(session, &form)
            .await?;
        run.advance(WorkflowState::Final)?;

        let messages = extractor::direct_final_messages(&final_page.body)?;
        if messages.len() < submitted.len() {
            return Err(AppError::workflow(
                "direct_final",
                format!(
                    "结果行数 {} 少于提交课程数 {}",
                    messages.len(),
                    submitted.len()
                ),
            ));
        }

        let mut results = Vec::with_capacity(codes.len());
        for code in codes {
            let outcome = match submitted.iter().position(|c| c == code) {
                Some(i) => Outcome::from_message(messages[i].clone(), ADD_SUCCESS),
                None => Outcome::NotFound,
            };
            self.log_outcome(run.name(), code, &outcome);
            results.push(CourseResult::new(code.clone(), outcome));
        }
        let all_success = results
            .iter()
            .filter(|r| r.outcome != Outcome::NotFound)
            .all(|r| r.outcome.is_success());
        run.finish(all_success)?;
        Ok(results)
    }

    /// 查询选课号码的名额，不做任何加选
    ///
    /// 确认页中找不到的号码不出现在结果中。
    pub async fn check_seats<T: Transport>(
        &self,
        session: &mut Session<T>,
        codes: &[String],
    ) -> Result<Vec<SeatStatus>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        session.ensure_academic_session().await?;

        let confirm = self.submit_codes(session, codes).await?;
        let table = extractor::extract_table(&confirm.body, FormRole::Code)?;

        let mut seats = Vec::new();
        for code in codes {
            match extractor::seat_status_for_row(&table, code)? {
                Some(status) => {
                    if self.verbose_logging {
                        info!(
                            "课程 {} 名额: 可选 {} / 已选 {}",
                            code, status.available, status.selected
                        );
                    }
                    seats.push(status);
                }
                None => warn!("确认页中找不到课程 {}", code),
            }
        }
        Ok(seats)
    }

    /// 退选
    pub async fn remove<T: Transport>(
        &self,
        session: &mut Session<T>,
        code: &str,
    ) -> Result<CourseResult> {
        session.ensure_academic_session().await?;
        let mut run = WorkflowRun::start("drop");

        let list = Step::get("delete_list", Endpoint::DeleteList)
            .expect(DELETE_LIST)
            .run(session, &FormData::new())
            .await?;
        run.advance(WorkflowState::List)?;

        let table = extractor::extract_table(&list.body, FormRole::Drop)?;
        let Some(token) = extractor::token_for_row(&table, code) else {
            return Ok(self.not_found(&run, code));
        };

        let mut form = FormData::new();
        form.push("v_del", token.as_str());
        Step::post("delete_check", Endpoint::DeleteCheck)
            .expect(code)
            .run(session, &form)
            .await?;
        run.advance(WorkflowState::Confirm)?;

        let final_page = Step::post("delete_final", Endpoint::DeleteFinal)
            .expect(code)
            .run(session, &form)
            .await?;
        run.advance(WorkflowState::Final)?;

        let message = extractor::final_message(&final_page.body, FinalPage::Drop)?;
        self.conclude(&mut run, code, message, DROP_SUCCESS)
    }

    /// 通识课程一览表
    pub async fn ge_listing<T: Transport>(
        &self,
        session: &mut Session<T>,
    ) -> Result<Vec<CourseRecord>> {
        session.ensure_academic_session().await?;
        let list = self.open_ge_list(session).await?;
        let records = extractor::parse_ge_listing(&list.body)?;
        info!("通识课程一览表: {} 门课程", records.len());
        Ok(records)
    }

    /// 通识入口 → 选课流程页 → 课程列表
    async fn open_ge_list<T: Transport>(&self, session: &Session<T>) -> Result<HttpPage> {
        let empty = FormData::new();
        Step::get("ge_entry", Endpoint::GeEntry)
            .expect(GE_ENTRY)
            .run(session, &empty)
            .await?;
        Step::get("ge_select", Endpoint::GeSelect)
            .reject(NOT_OPEN)
            .run(session, &empty)
            .await?;
        Step::post("ge_list", Endpoint::GeList)
            .reject(NOT_OPEN)
            .expect(GE_LIST)
            .run(session, &empty)
            .await
    }

    /// 选课号码列表页 → 提交号码，返回确认页
    async fn submit_codes<T: Transport>(
        &self,
        session: &Session<T>,
        codes: &[String],
    ) -> Result<HttpPage> {
        Step::get("direct_list", Endpoint::DirectList)
            .expect(DIRECT_LIST)
            .run(session, &FormData::new())
            .await?;

        let mut form = FormData::new();
        for code in codes {
            form.push("V_WANT", code.as_str());
        }
        Step::post("direct_check", Endpoint::DirectCheck)
            .expect_all(codes.iter().cloned())
            .run(session, &form)
            .await
    }

    fn not_found(&self, run: &WorkflowRun, code: &str) -> CourseResult {
        warn!("[工作流 {}] 列表中找不到课程 {}", run.name(), code);
        CourseResult::new(code, Outcome::NotFound)
    }

    fn conclude(
        &self,
        run: &mut WorkflowRun,
        code: &str,
        message: String,
        success_marker: &str,
    ) -> Result<CourseResult> {
        let outcome = Outcome::from_message(message, success_marker);
        run.finish(outcome.is_success())?;
        self.log_outcome(run.name(), code, &outcome);
        Ok(CourseResult::new(code, outcome))
    }

    fn log_outcome(&self, flow: &str, code: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Success { message } => info!("[工作流 {}] ✓ {} {}", flow, code, message),
            Outcome::Rejected { message } => {
                warn!("[工作流 {}] ✗ {} 被拒绝: {}", flow, code, message)
            }
            Outcome::NotFound => warn!("[工作流 {}] ? {} 不在列表中", flow, code),
        }
    }
}
