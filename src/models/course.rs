use serde::{Deserialize, Serialize};
use std::fmt;

/// 课程行的隐藏字段值
///
/// 列表页中每一行都带有一个隐藏 input，后续步骤必须原样回传才能选中该行。
/// 只在一次流程执行内有效。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseToken(String);

impl CourseToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 课程名额
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatStatus {
    pub code: String,
    /// 可选人数
    pub available: u32,
    /// 已选人数
    pub selected: u32,
}

impl SeatStatus {
    /// 可选人数大于已选人数即视为有名额
    pub fn has_vacancy(&self) -> bool {
        self.available > self.selected
    }
}

/// 通识课程列表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// 选课号码（第 2 列）
    pub code: String,
    /// 整行单元格文字
    pub cells: Vec<String>,
}

/// 一次业务操作的结果
///
/// 业务拒绝是正常结果，不走错误通道。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// 成功，附带门户返回的原文
    Success { message: String },
    /// 被门户拒绝（如人数已满），附带门户返回的原文
    Rejected { message: String },
    /// 列表页中找不到该选课号码
    NotFound,
}

impl Outcome {
    /// 根据最终页面的消息文字判断结果
    pub fn from_message(message: impl Into<String>, success_marker: &str) -> Self {
        let message = message.into();
        if message.contains(success_marker) {
            Outcome::Success { message }
        } else {
            Outcome::Rejected { message }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Success { message } | Outcome::Rejected { message } => Some(message),
            Outcome::NotFound => None,
        }
    }
}

/// 单门课程的操作结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseResult {
    pub code: String,
    pub outcome: Outcome,
}

impl CourseResult {
    pub fn new(code: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            code: code.into(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vacancy_is_strictly_greater() {
        let open = SeatStatus {
            code: "1159".into(),
            available: 5,
            selected: 2,
        };
        let full = SeatStatus {
            code: "1159".into(),
            available: 60,
            selected: 60,
        };
        assert!(open.has_vacancy());
        assert!(!full.has_vacancy());
    }

    #[test]
    fn test_outcome_from_message() {
        let ok = Outcome::from_message("0348 加選成功", "加選成功");
        assert!(ok.is_success());

        let full = Outcome::from_message("選課人數已額滿", "加選成功");
        assert_eq!(
            full,
            Outcome::Rejected {
                message: "選課人數已額滿".into()
            }
        );
    }
}
