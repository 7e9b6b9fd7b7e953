//! 监考事件记录 - 业务能力层
//!
//! 只负责"追加一行记录"能力，不关心考试流程

use std::fs::OpenOptions;
use std::io::Write;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::exam::{ExamOutcome, IntegritySignal};

/// 监考事件记录
///
/// 强制结束与成功交卷各写一行，离开考试不记录
pub struct IncidentLog {
    log_file_path: String,
}

impl IncidentLog {
    pub fn new() -> Self {
        Self {
            log_file_path: "incidents.txt".to_string(),
        }
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    /// 生成一行记录；不需要记录时返回 None
    pub fn format_line(
        timestamp: &str,
        quiz_id: &str,
        outcome: &ExamOutcome,
        signal: &IntegritySignal,
    ) -> Option<String> {
        let verdict = match outcome {
            ExamOutcome::Submitted { score, .. } => format!("交卷 得分 {}", score),
            ExamOutcome::Terminated { violation, .. } => {
                format!("强制结束 ({})", violation.describe())
            }
            ExamOutcome::Left => return None,
        };
        Some(format!(
            "[{}] 试卷 {} | {} | 退出全屏 {} 次 | 切换标签页 {} 次\n",
            timestamp, quiz_id, verdict, signal.fullscreen_exit_count, signal.tab_switch_count
        ))
    }

    /// 追加一条记录
    pub fn record(
        &self,
        quiz_id: &str,
        outcome: &ExamOutcome,
        signal: &IntegritySignal,
    ) -> AppResult<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let Some(line) = Self::format_line(&timestamp, quiz_id, outcome, signal) else {
            return Ok(());
        };
        debug!("写入监考记录: {}", line.trim_end());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))?;
        Ok(())
    }
}

impl Default for IncidentLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::Violation;
    use crate::services::local_store::test_support::temp_dir;

    #[test]
    fn test_format_line() {
        let signal = IntegritySignal {
            fullscreen_exit_count: 3,
            tab_switch_count: 1,
            ..Default::default()
        };
        let outcome = ExamOutcome::Terminated {
            violation: Violation::FullscreenExits { count: 3 },
            signal,
        };
        assert_eq!(
            IncidentLog::format_line("2024-01-01 08:00:00", "q1", &outcome, &signal).unwrap(),
            "[2024-01-01 08:00:00] 试卷 q1 | 强制结束 (退出全屏 3 次) | 退出全屏 3 次 | 切换标签页 1 次\n"
        );
        assert!(IncidentLog::format_line("t", "q1", &ExamOutcome::Left, &signal).is_none());
    }

    #[test]
    fn test_record_appends() {
        let dir = temp_dir("incidents");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("incidents.txt");
        let log = IncidentLog::with_path(path.to_string_lossy().to_string());
        let submitted = ExamOutcome::Submitted {
            quiz_id: "q1".to_string(),
            score: 80,
        };
        let signal = IntegritySignal::default();
        log.record("q1", &submitted, &signal).unwrap();
        log.record("q1", &submitted, &signal).unwrap();
        log.record("q1", &ExamOutcome::Left, &signal).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("交卷 得分 80"));
    }
}
