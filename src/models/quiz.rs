use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::page::PageMeta;

/// 每道题的默认作答时间（秒）
pub const SECONDS_PER_QUESTION: u32 = 60;
/// 每道题的选项数量
pub const OPTION_COUNT: usize = 4;

/// 单道选择题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// 正确选项下标（从 0 开始）
    #[serde(default)]
    pub correct_option: usize,
}

/// 试卷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl Quiz {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// 实际考试时长
    ///
    /// 未设置时长时按每题 60 秒计算，没有题目时按 1 题计
    pub fn effective_duration(&self) -> u32 {
        match self.duration_seconds {
            Some(seconds) if seconds > 0 => seconds,
            _ => self.question_count().max(1) as u32 * SECONDS_PER_QUESTION,
        }
    }
}

/// 试卷分页列表
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizPage {
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

// ========== 出题 ==========

/// 待发布的题目草稿
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    /// 正确选项下标（从 0 开始）
    #[serde(default)]
    pub correct: usize,
}

/// 待发布的试卷草稿（TOML 文件格式）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    /// 考试时长（分钟），不填或 0 表示按题目数量计算
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default, rename = "question")]
    pub questions: Vec<QuestionDraft>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

/// 创建试卷请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub title: String,
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl QuizDraft {
    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }

    /// 校验草稿并转换为创建请求
    pub fn into_request(self) -> Result<CreateQuizRequest, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::MissingField("试卷标题"));
        }
        if self.questions.is_empty() {
            return Err(ValidationError::NoQuestions);
        }

        let mut questions = Vec::with_capacity(self.questions.len());
        for (idx, draft) in self.questions.into_iter().enumerate() {
            let number = idx + 1;
            let text = draft.text.trim().to_string();
            if text.is_empty() {
                return Err(ValidationError::MissingField("题干"));
            }
            let options: Vec<String> = draft.options.iter().map(|o| o.trim().to_string()).collect();
            if options.len() != OPTION_COUNT || options.iter().any(|o| o.is_empty()) {
                return Err(ValidationError::InvalidOptions {
                    question: number,
                    expected: OPTION_COUNT,
                });
            }
            if draft.correct >= OPTION_COUNT {
                return Err(ValidationError::InvalidCorrectOption {
                    question: number,
                    index: draft.correct,
                });
            }
            questions.push(Question {
                question_text: text,
                options,
                correct_option: draft.correct,
            });
        }

        Ok(CreateQuizRequest {
            title,
            questions,
            duration_seconds: self
                .duration_minutes
                .filter(|m| *m > 0)
                .map(|m| m * 60),
        })
    }
}
