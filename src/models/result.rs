use serde::{Deserialize, Serialize};

use crate::models::page::PageMeta;

/// 上报成绩的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSubmission {
    pub quiz_id: String,
    /// 百分制整数成绩
    pub score: u8,
}

/// 服务端保存的一条成绩
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub quiz_id: String,
    pub score: u8,
}

/// 成绩分页列表
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultPage {
    #[serde(default)]
    pub results: Vec<QuizResult>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// 成绩档次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn of(score: u8) -> Self {
        match score {
            80.. => ScoreBand::High,
            60..=79 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }

    /// 成绩评语
    pub fn remark(self) -> &'static str {
        match self {
            ScoreBand::High => "优秀！",
            ScoreBand::Medium => "做得不错！",
            ScoreBand::Low => "继续努力！",
        }
    }
}

/// 管理员成绩筛选条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFilter {
    /// 按试卷 ID 精确匹配
    pub quiz_id: Option<String>,
    /// 按用户 ID 子串匹配（忽略大小写）
    pub user_query: Option<String>,
}

impl ResultFilter {
    pub fn matches(&self, result: &QuizResult) -> bool {
        let quiz_ok = self
            .quiz_id
            .as_deref()
            .map_or(true, |id| id.is_empty() || result.quiz_id == id);
        let user_ok = self.user_query.as_deref().map_or(true, |q| {
            q.is_empty() || result.user_id.to_lowercase().contains(&q.to_lowercase())
        });
        quiz_ok && user_ok
    }

    pub fn apply<'a>(&self, results: &'a [QuizResult]) -> Vec<&'a QuizResult> {
        results.iter().filter(|r| self.matches(r)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.quiz_id.is_none() && self.user_query.is_none()
    }
}
