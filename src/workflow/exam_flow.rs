//! 考试流程 - 流程层
//!
//! 流程顺序：
//! 1. 拉取试卷 → 打开监考页面
//! 2. 运行考试会话，同时转发考生输入、渲染状态快照
//! 3. 清理页面 → 写监考记录 → 展示结果

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::browser::{self, BrowserPlatform};
use crate::clients::QuizApiClient;
use crate::config::Config;
use crate::error::{AppResult, ExamError};
use crate::exam::{
    ExamCommand, ExamOutcome, ExamPlatform, ExamSession, ExamSettings, ExamSnapshot,
    IntegritySignal, ResultReporter,
};
use crate::infrastructure::JsExecutor;
use crate::models::quiz::OPTION_COUNT;
use crate::models::{Quiz, User};
use crate::services::IncidentLog;
use crate::ui::{render, Console};
use crate::utils::logging::log_exam_start;
use crate::workflow::exam_ctx::ExamCtx;

/// 一次考试的结果
#[derive(Debug, Clone)]
pub struct ExamReport {
    pub quiz: Quiz,
    pub outcome: ExamOutcome,
    pub signal: IntegritySignal,
}

/// 解析考试页面的输入，题号与选项从 1 开始，选项也可以写字母
pub fn parse_exam_command(line: &str) -> Result<ExamCommand, String> {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default().to_ascii_lowercase();
    match head.as_str() {
        "a" | "answer" => {
            let question = parts
                .next()
                .and_then(|q| q.parse::<usize>().ok())
                .filter(|q| *q >= 1)
                .ok_or_else(|| "用法: a <题号> <选项>".to_string())?;
            let option = parts
                .next()
                .and_then(parse_option)
                .ok_or_else(|| "选项应为 1-4 或 A-D".to_string())?;
            Ok(ExamCommand::Answer {
                question: question - 1,
                option,
            })
        }
        "s" | "submit" => Ok(ExamCommand::Submit),
        "f" | "fullscreen" => Ok(ExamCommand::EnterFullscreen),
        "x" | "exit" => Ok(ExamCommand::ExitFullscreen),
        "q" | "leave" => Ok(ExamCommand::Leave),
        "" => Err(String::new()),
        other => Err(format!("未知指令: {}", other)),
    }
}

/// 选项只能是 1-4 或 A-D
fn parse_option(token: &str) -> Option<usize> {
    let index = match token.parse::<usize>() {
        Ok(n) => n.checked_sub(1)?,
        Err(_) => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => {
                    (c.to_ascii_uppercase() as u8 - b'A') as usize
                }
                _ => return None,
            }
        }
    };
    (index < OPTION_COUNT).then_some(index)
}

/// 考试流程
pub struct ExamFlow {
    config: Config,
    settings: ExamSettings,
    incident_log: IncidentLog,
}

impl ExamFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            settings: ExamSettings::from(config),
            incident_log: IncidentLog::with_path(config.incident_log_file.clone()),
        }
    }

    /// 在浏览器监考页面中参加考试
    pub async fn run(
        &self,
        api: &QuizApiClient,
        user: &User,
        quiz_id: &str,
        console: &mut Console,
    ) -> AppResult<ExamReport> {
        let quiz = api.get_quiz(quiz_id).await?;
        if quiz.questions.is_empty() {
            return Err(ExamError::EmptyQuiz.into());
        }
        let ctx = ExamCtx::new(&quiz, user);
        log_exam_start(&ctx.quiz_id, &ctx.title, ctx.question_count, ctx.duration);

        let (_browser, page) = browser::open_exam_page(&self.config).await?;
        let platform = BrowserPlatform::attach(
            JsExecutor::new(page),
            Duration::from_millis(self.config.event_poll_interval_ms),
        )
        .await?;

        let report = self.supervise(quiz, &platform, api, console).await;
        platform.close().await;

        let report = report?;
        self.record(&ctx, &report);
        Ok(report)
    }

    /// 运行考试会话，直到交卷、被强制结束或离开
    pub async fn supervise<P: ExamPlatform, R: ResultReporter>(
        &self,
        quiz: Quiz,
        platform: &P,
        reporter: &R,
        console: &mut Console,
    ) -> AppResult<ExamReport> {
        let question_count = quiz.question_count();
        let (session, mut snapshots) =
            ExamSession::new(quiz.clone(), platform, reporter, self.settings.clone())?;
        let (commands, command_rx) = mpsc::channel(16);

        render::print_exam_intro(&quiz);

        let run = session.run(command_rx);
        tokio::pin!(run);
        let mut last_rendered: Option<ExamSnapshot> = None;
        let mut input_open = true;

        let outcome = loop {
            tokio::select! {
                outcome = &mut run => break outcome,
                changed = snapshots.changed() => {
                    if changed.is_ok() {
                        let snapshot = snapshots.borrow_and_update().clone();
                        if render::should_render(last_rendered.as_ref(), &snapshot) {
                            println!("{}", render::format_snapshot(&snapshot, question_count));
                            last_rendered = Some(snapshot);
                        }
                    }
                }
                line = console.next_line(), if input_open => {
                    let command = match line {
                        Some(line) => match parse_exam_command(&line) {
                            Ok(command) => command,
                            Err(hint) => {
                                if !hint.is_empty() {
                                    println!("{}", hint);
                                }
                                continue;
                            }
                        },
                        None => {
                            input_open = false;
                            ExamCommand::Leave
                        }
                    };
                    if commands.send(command).await.is_err() {
                        warn!("考试会话已结束，指令被忽略");
                    }
                }
            }
        };

        let signal = snapshots.borrow().signal;
        render::print_exam_outcome(&quiz, &outcome);
        Ok(ExamReport {
            quiz,
            outcome,
            signal,
        })
    }

    fn record(&self, ctx: &ExamCtx, report: &ExamReport) {
        match self
            .incident_log
            .record(&ctx.quiz_id, &report.outcome, &report.signal)
        {
            Ok(()) => info!("{} 监考记录已写入", ctx),
            Err(e) => warn!("{} 写入监考记录失败: {}", ctx, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exam_command() {
        assert_eq!(
            parse_exam_command("a 1 2"),
            Ok(ExamCommand::Answer {
                question: 0,
                option: 1
            })
        );
        assert_eq!(
            parse_exam_command("A 3 d"),
            Ok(ExamCommand::Answer {
                question: 2,
                option: 3
            })
        );
        assert_eq!(parse_exam_command("s"), Ok(ExamCommand::Submit));
        assert_eq!(parse_exam_command("f"), Ok(ExamCommand::EnterFullscreen));
        assert_eq!(parse_exam_command("x"), Ok(ExamCommand::ExitFullscreen));
        assert_eq!(parse_exam_command("q"), Ok(ExamCommand::Leave));
        assert!(parse_exam_command("a 0 1").is_err());
        assert!(parse_exam_command("a 1").is_err());
        assert!(parse_exam_command("a 1 0").is_err());
        assert!(parse_exam_command("jump").is_err());
    }

    #[test]
    fn test_parse_option_is_limited_to_four_choices() {
        assert!(parse_exam_command("a 1 z").is_err());
        assert!(parse_exam_command("a 1 e").is_err());
        assert!(parse_exam_command("a 1 5").is_err());
        assert!(parse_exam_command("a 1 ab").is_err());
        assert_eq!(
            parse_exam_command("a 2 4"),
            Ok(ExamCommand::Answer {
                question: 1,
                option: 3
            })
        );
    }
}
