//! 考试上下文
//!
//! 封装"谁在考哪份试卷"这一信息，用于日志与记录

use std::fmt::Display;

use crate::models::{Quiz, User};

#[derive(Debug, Clone)]
pub struct ExamCtx {
    pub quiz_id: String,
    pub title: String,
    pub username: String,
    pub question_count: usize,
    /// 考试时长（秒）
    pub duration: u32,
}

impl ExamCtx {
    pub fn new(quiz: &Quiz, user: &User) -> Self {
        Self {
            quiz_id: quiz.id.clone(),
            title: quiz.title.clone(),
            username: user.username.clone(),
            question_count: quiz.question_count(),
            duration: quiz.effective_duration(),
        }
    }
}

impl Display for ExamCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[试卷 ID#{} 考生 {}]", self.quiz_id, self.username)
    }
}
