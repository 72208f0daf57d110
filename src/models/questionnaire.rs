use crate::error::AppError;
use crate::models::form::FormData;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 问卷填答策略
///
/// 数值即单选题提交的分数。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillingPolicy {
    Awful = 1,
    Neutral = 3,
    #[default]
    Great = 5,
}

impl FillingPolicy {
    /// 单选题提交值
    pub fn value(self) -> u8 {
        self as u8
    }

    /// 反向计分题（`v_B10`）的提交值
    pub fn reversed(self) -> u8 {
        6 - self.value()
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(FillingPolicy::Awful),
            3 => Some(FillingPolicy::Neutral),
            5 => Some(FillingPolicy::Great),
            _ => None,
        }
    }
}

impl FromStr for FillingPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let policy = match name.as_str() {
            "awful" => Some(FillingPolicy::Awful),
            "neutral" => Some(FillingPolicy::Neutral),
            "great" => Some(FillingPolicy::Great),
            // 也接受分数本身
            other => other.parse().ok().and_then(FillingPolicy::from_value),
        };
        policy.ok_or_else(|| AppError::Config(format!("未知的填答策略: {}", name)))
    }
}

/// 期末教学意见调查中的一份问卷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    /// 表头 → 单元格文字（按列顺序）
    pub columns: Vec<(String, String)>,
    /// 课程名称，用于校验填答页面
    pub course_name: String,
    /// 填答页面地址；已关闭的问卷没有链接
    pub fill_url: Option<String>,
    /// 是否已完成填答
    pub completed: bool,
}

impl Questionnaire {
    pub fn column(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// 可以填写：有链接且尚未完成
    pub fn is_fillable(&self) -> bool {
        self.fill_url.is_some() && !self.completed
    }
}

/// 一位 TA 的问卷表单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaForm {
    /// 表单隐藏字段，原样提交即可打开填答页
    pub fields: FormData,
    pub completed: bool,
}

impl TaForm {
    /// TA 标识（`v_ta`）
    pub fn ta_id(&self) -> Option<&str> {
        self.fields.get("v_ta")
    }
}

/// TA 服务意见调查中的一门课程
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaQuestionnaire {
    pub columns: Vec<(String, String)>,
    pub forms: Vec<TaForm>,
}
