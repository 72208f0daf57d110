//! 流程状态机
//!
//! 每个业务流程都按 `Start → List → Confirm → Final → {Success, Rejected}` 推进。

use crate::error::{AppError, Result};
use std::fmt::{self, Display};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Start,
    List,
    Confirm,
    Final,
    Success,
    Rejected,
}

impl WorkflowState {
    /// 是否允许从当前状态转到 `next`
    pub fn can_advance_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (Start, List) | (List, Confirm) | (Confirm, Final) | (Final, Success) | (Final, Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowState::Success | WorkflowState::Rejected)
    }
}

impl Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Start => "START",
            WorkflowState::List => "LIST",
            WorkflowState::Confirm => "CONFIRM",
            WorkflowState::Final => "FINAL",
            WorkflowState::Success => "SUCCESS",
            WorkflowState::Rejected => "REJECTED",
        };
        f.write_str(name)
    }
}

/// 一次流程执行
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    name: &'static str,
    state: WorkflowState,
}

impl WorkflowRun {
    pub fn start(name: &'static str) -> Self {
        debug!("[工作流 {}] {}", name, WorkflowState::Start);
        Self {
            name,
            state: WorkflowState::Start,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// 推进到下一状态，非法跳转返回流程错误
    pub fn advance(&mut self, next: WorkflowState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(AppError::workflow(
                self.name,
                format!("非法状态跳转 {} → {}", self.state, next),
            ));
        }
        debug!("[工作流 {}] {} → {}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }

    /// 根据最终结果进入终态
    pub fn finish(&mut self, success: bool) -> Result<()> {
        let next = if success {
            WorkflowState::Success
        } else {
            WorkflowState::Rejected
        };
        self.advance(next)
    }
}
