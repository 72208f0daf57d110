//! 教学意见调查流程 - 流程层
//!
//! 期末问卷：填答页（LIST）→ 确认页（CONFIRM）→ 保存（FINAL）
//! TA 问卷：填答页（LIST）→ 组装答案（CONFIRM，无独立确认页）→ 送出（FINAL）

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::infrastructure::Transport;
use crate::models::markers::{FILLED, QUES_LIST, QUES_SAVED, QUES_TA_LIST};
use crate::models::{
    Endpoint, FillingPolicy, FormData, Outcome, Questionnaire, TaForm, TaQuestionnaire,
};
use crate::services::extractor::{self, FillForm};
use crate::services::Session;
use crate::utils::html::Document;
use crate::utils::logging::truncate_text;
use crate::workflow::state::{WorkflowRun, WorkflowState};
use crate::workflow::step::{Method, Step, Target};
use tracing::{debug, info, warn};

/// 固定填 1 分的题目
const FIELD_FIXED_ONE: &str = "v_A1";
/// 反向计分题
const FIELD_REVERSED: &str = "v_B10";

/// 问卷流程
#[derive(Debug, Default)]
pub struct QuestionnaireFlow {
    policy: FillingPolicy,
}

impl QuestionnaireFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            policy: config.filling_policy,
        }
    }

    /// 默认填答策略
    pub fn policy(&self) -> FillingPolicy {
        self.policy
    }

    /// 期末问卷列表
    pub async fn list<T: Transport>(&self, session: &mut Session<T>) -> Result<Vec<Questionnaire>> {
        session.ensure_academic_session().await?;
        info!("BEGIN: 获取期末问卷列表");
        let page = Step::get("ques_list", Endpoint::QuesList)
            .expect(QUES_LIST)
            .run(session, &FormData::new())
            .await?;
        let questionnaires = extractor::parse_questionnaires(&page.body, &page.url)?;
        info!(
            "END: 共 {} 份问卷，未完成 {} 份",
            questionnaires.len(),
            questionnaires.iter().filter(|q| !q.completed).count()
        );
        Ok(questionnaires)
    }

    /// 填写一份期末问卷
    pub async fn fill<T: Transport>(
        &self,
        session: &mut Session<T>,
        questionnaire: &Questionnaire,
        policy: FillingPolicy,
    ) -> Result<Outcome> {
        session.ensure_academic_session().await?;
        let url = questionnaire
            .fill_url
            .clone()
            .ok_or_else(|| AppError::workflow("ques_fill", "问卷没有填答链接"))?;
        let mut run = WorkflowRun::start("ques_fill");
        info!("[工作流 {}] {} ({:?})", run.name(), questionnaire.course_name, policy);

        let fill_page = Step::new("ques_fill", Method::Get, Target::Url(url))
            .expect(questionnaire.course_name.as_str())
            .run(session, &FormData::new())
            .await?;
        run.advance(WorkflowState::List)?;

        let fill = extractor::parse_fill_form(&fill_page.body)?;
        let answers = Self::build_answers(&fill, policy);
        debug!("填答字段: {:?}", answers.pairs());

        let confirm = Step::post("ques_confirm", Endpoint::QuesConfirm)
            .expect(questionnaire.course_name.as_str())
            .run(session, &answers)
            .await?;
        run.advance(WorkflowState::Confirm)?;

        let confirm_fields = extractor::first_form_hidden_fields(&confirm.body)?;
        let final_page = Step::post("ques_final", Endpoint::QuesFinal)
            .run(session, &confirm_fields)
            .await?;
        run.advance(WorkflowState::Final)?;

        let outcome = if final_page.body.contains(QUES_SAVED) {
            Outcome::Success {
                message: QUES_SAVED.to_string(),
            }
        } else {
            Outcome::Rejected {
                message: page_summary(&final_page.body),
            }
        };
        run.finish(outcome.is_success())?;
        log_outcome(run.name(), &questionnaire.course_name, &outcome);
        Ok(outcome)
    }

    /// 填写列表中所有未完成的问卷
    ///
    /// 单份失败只记录日志，不影响其余问卷。
    pub async fn fill_pending<T: Transport>(
        &self,
        session: &mut Session<T>,
    ) -> Result<Vec<(String, Outcome)>> {
        let questionnaires = self.list(session).await?;
        let mut results = Vec::new();
        for questionnaire in questionnaires.iter().filter(|q| q.is_fillable()) {
            match self.fill(session, questionnaire, self.policy).await {
                Ok(outcome) => results.push((questionnaire.course_name.clone(), outcome)),
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => warn!("问卷 {} 填写失败: {}", questionnaire.course_name, e),
            }
        }
        Ok(results)
    }

    /// TA 服务意见调查列表
    pub async fn list_ta<T: Transport>(
        &self,
        session: &mut Session<T>,
    ) -> Result<Vec<TaQuestionnaire>> {
        session.ensure_academic_session().await?;
        info!("BEGIN: 获取 TA 问卷列表");
        let page = Step::get("ques_ta_list", Endpoint::QuesTaList)
            .expect(QUES_TA_LIST)
            .run(session, &FormData::new())
            .await?;
        let questionnaires = extractor::parse_ta_questionnaires(&page.body)?;
        info!("END: 共 {} 门课程", questionnaires.len());
        Ok(questionnaires)
    }

    /// 填写一位 TA 的问卷
    pub async fn fill_ta<T: Transport>(
        &self,
        session: &mut Session<T>,
        form: &TaForm,
        policy: FillingPolicy,
    ) -> Result<Outcome> {
        session.ensure_academic_session().await?;
        let ta_id = form
            .ta_id()
            .ok_or_else(|| AppError::workflow("ques_ta_fill", "表单缺少 v_ta"))?
            .to_string();
        let mut run = WorkflowRun::start("ta_fill");

        let fill_page = Step::post("ques_ta_fill", Endpoint::QuesTaFill)
            .expect(ta_id.as_str())
            .run(session, &form.fields)
            .await?;
        run.advance(WorkflowState::List)?;

        let fill = extractor::parse_fill_form(&fill_page.body)?;
        let mut answers = fill.hidden.clone();
        for name in &fill.radios {
            answers.set(name.as_str(), policy.value().to_string());
        }
        for name in &fill.textareas {
            answers.set(name.as_str(), "");
        }
        run.advance(WorkflowState::Confirm)?;

        let send = Step::post("ques_ta_send", Endpoint::QuesTaSend)
            .run(session, &answers)
            .await?;
        run.advance(WorkflowState::Final)?;

        let marker = format!("{}&nbsp;&nbsp;{}", ta_id, FILLED);
        let outcome = if send.body.contains(&marker) {
            Outcome::Success {
                message: FILLED.to_string(),
            }
        } else {
            Outcome::Rejected {
                message: page_summary(&send.body),
            }
        };
        run.finish(outcome.is_success())?;
        log_outcome(run.name(), &ta_id, &outcome);
        Ok(outcome)
    }

    /// 按策略生成期末问卷答案
    ///
    /// 隐藏字段原样保留；单选题统一填策略分数；`v_A1` 固定为 1；
    /// `v_B10` 为反向计分；文本框留空。
    pub fn build_answers(fill: &FillForm, policy: FillingPolicy) -> FormData {
        let mut answers = fill.hidden.clone();
        for name in &fill.radios {
            answers.set(name.as_str(), policy.value().to_string());
        }
        if answers.contains(FIELD_FIXED_ONE) {
            answers.set(FIELD_FIXED_ONE, "1");
        }
        if answers.contains(FIELD_REVERSED) {
            answers.set(FIELD_REVERSED, policy.reversed().to_string());
        }
        for name in &fill.texts {
            answers.set(name.as_str(), "");
        }
        answers
    }
}

/// 页面文字摘要，用作拒绝原因
fn page_summary(html: &str) -> String {
    truncate_text(&Document::parse(html).root().text(), 120)
}

fn log_outcome(flow: &str, subject: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Success { .. } => info!("[工作流 {}] ✓ {} 已完成", flow, subject),
        Outcome::Rejected { message } => warn!("[工作流 {}] ✗ {} 未保存: {}", flow, subject, message),
        Outcome::NotFound => warn!("[工作流 {}] ? {} 不存在", flow, subject),
    }
}
