//! 交卷流程
//!
//! 单一的阶段标志保证手动交卷与超时交卷互斥，成绩只会成功上报一次。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::clients::QuizApiClient;
use crate::error::{ApiError, AppError, AppResult, ExamError};
use crate::models::ResultSubmission;

/// 成绩上报能力
#[allow(async_fn_in_trait)]
pub trait ResultReporter {
    async fn report(&self, submission: &ResultSubmission) -> AppResult<()>;
}

impl ResultReporter for QuizApiClient {
    async fn report(&self, submission: &ResultSubmission) -> AppResult<()> {
        self.submit_result(submission).await
    }
}

/// 交卷触发来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// 考生手动交卷
    Manual,
    /// 倒计时结束
    Timeout,
}

/// 交卷阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// 尚未交卷
    Idle,
    /// 正在上报
    InFlight { score: u8 },
    /// 上报失败，保留已计算的成绩以便重试
    Failed { score: u8, message: String },
    /// 上报成功
    Done { score: u8 },
}

/// 交卷状态
#[derive(Debug, Clone)]
pub struct Submission {
    quiz_id: String,
    phase: SubmissionPhase,
}

impl Submission {
    pub fn new(quiz_id: impl Into<String>) -> Self {
        Self {
            quiz_id: quiz_id.into(),
            phase: SubmissionPhase::Idle,
        }
    }

    pub fn phase(&self) -> &SubmissionPhase {
        &self.phase
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.phase, SubmissionPhase::InFlight { .. })
    }

    /// 开始交卷；正在上报或已完成时拒绝
    pub fn begin(&mut self, score: u8) -> Result<ResultSubmission, ExamError> {
        match self.phase {
            SubmissionPhase::Idle | SubmissionPhase::Failed { .. } => {
                self.phase = SubmissionPhase::InFlight { score };
                Ok(ResultSubmission {
                    quiz_id: self.quiz_id.clone(),
                    score,
                })
            }
            SubmissionPhase::InFlight { .. } | SubmissionPhase::Done { .. } => {
                Err(ExamError::AlreadySubmitted)
            }
        }
    }

    /// 处理上报结果
    pub fn finish(&mut self, result: &AppResult<()>) {
        let SubmissionPhase::InFlight { score } = self.phase else {
            return;
        };
        self.phase = match result {
            Ok(()) => SubmissionPhase::Done { score },
            Err(e) => SubmissionPhase::Failed {
                score,
                message: e.user_message(),
            },
        };
    }

    /// 强制结束时放弃进行中的上报
    pub fn abandon(&mut self) {
        if let SubmissionPhase::InFlight { score } = self.phase {
            self.phase = SubmissionPhase::Failed {
                score,
                message: "考试已结束".to_string(),
            };
        }
    }
}

/// 网络错误与 5xx 可以重试，其余错误直接返回
fn is_retryable(err: &AppError) -> bool {
    match err {
        AppError::Api(ApiError::RequestFailed { .. }) => true,
        AppError::Api(ApiError::BadResponse { status, .. }) => *status >= 500,
        _ => false,
    }
}

/// 上报成绩（带重试逻辑）
pub async fn report_with_retry<R: ResultReporter>(
    reporter: &R,
    submission: ResultSubmission,
    max_retries: usize,
    retry_delay: Duration,
) -> AppResult<()> {
    let max_retries = max_retries.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match reporter.report(&submission).await {
            Ok(()) => {
                info!(
                    "✓ 成绩上报成功 [试卷 {}] 得分 {}",
                    submission.quiz_id, submission.score
                );
                return Ok(());
            }
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                warn!(
                    "成绩上报失败 (尝试 {}/{}): {}，{} 毫秒后重试...",
                    attempt,
                    max_retries,
                    e,
                    retry_delay.as_millis()
                );
                sleep(retry_delay).await;
            }
            Err(e) => {
                warn!("成绩上报失败，已尝试 {} 次: {}", attempt, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    struct ScriptedReporter {
        replies: RefCell<VecDeque<AppResult<()>>>,
        calls: Cell<usize>,
    }

    impl ScriptedReporter {
        fn new(replies: Vec<AppResult<()>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: Cell::new(0),
            }
        }
    }

    impl ResultReporter for ScriptedReporter {
        async fn report(&self, _submission: &ResultSubmission) -> AppResult<()> {
            self.calls.set(self.calls.get() + 1);
            self.replies.borrow_mut().pop_front().unwrap_or(Ok(()))
        }
    }

    fn network_error() -> AppError {
        AppError::api_request_failed(
            "/api/results/submit",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
        )
    }

    fn submission() -> ResultSubmission {
        ResultSubmission {
            quiz_id: "q1".to_string(),
            score: 80,
        }
    }

    #[test]
    fn test_begin_is_exclusive() {
        let mut s = Submission::new("q1");
        let payload = s.begin(75).unwrap();
        assert_eq!(payload.score, 75);
        assert_eq!(s.begin(75), Err(ExamError::AlreadySubmitted));

        s.finish(&Err(network_error()));
        assert!(matches!(s.phase(), SubmissionPhase::Failed { score: 75, .. }));

        // 失败后允许重试
        s.begin(75).unwrap();
        s.finish(&Ok(()));
        assert_eq!(s.phase(), &SubmissionPhase::Done { score: 75 });
        assert_eq!(s.begin(75), Err(ExamError::AlreadySubmitted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_on_network_error() {
        let reporter = ScriptedReporter::new(vec![Err(network_error()), Ok(())]);
        report_with_retry(&reporter, submission(), 3, Duration::from_millis(2000))
            .await
            .unwrap();
        assert_eq!(reporter.calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_on_client_error() {
        let reporter = ScriptedReporter::new(vec![Err(AppError::Api(ApiError::BadResponse {
            endpoint: "/api/results/submit".to_string(),
            status: 401,
            message: "Login required".to_string(),
        }))]);
        let err = report_with_retry(&reporter, submission(), 3, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Login required");
        assert_eq!(reporter.calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let reporter = ScriptedReporter::new(vec![
            Err(network_error()),
            Err(network_error()),
            Err(network_error()),
            Ok(()),
        ]);
        assert!(report_with_retry(&reporter, submission(), 3, Duration::from_millis(10))
            .await
            .is_err());
        assert_eq!(reporter.calls.get(), 3);
    }
}
