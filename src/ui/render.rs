use crate::exam::{CameraStatus, ExamOutcome, ExamPhase, ExamSnapshot};
use crate::models::{PageMeta, Profile, Quiz, QuizResult, ResultFilter, ScoreBand, User};
use crate::services::{ProfileSource, PublishReport};
use crate::utils::logging::{format_countdown, truncate_text};

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn print_help() {
    println!(
        r#"可用命令:
  login / register / logout / whoami / forgot
  quizzes [页码]      查看试卷列表
  next / prev         翻页
  take <试卷ID>       开始考试
  results [页码]      查看成绩
  filter quiz <ID> | filter user <关键字> | filter clear   (管理员)
  create [文件]       发布 TOML 试卷草稿 (管理员)
  profile | profile set <字段> <值> | profile save
  help / quit

考试中:
  a <题号> <选项>     作答，如 a 1 2 或 a 1 B
  s 交卷  f 进入全屏  x 退出全屏  q 离开"#
    );
}

pub fn print_user(user: &User) {
    println!(
        "👤 {} ({}){}",
        user.username,
        user.role.name(),
        user.email
            .as_deref()
            .map(|e| format!(" <{}>", e))
            .unwrap_or_default()
    );
}

pub fn print_quiz_list(quizzes: &[Quiz], meta: &PageMeta, is_admin: bool) {
    if quizzes.is_empty() {
        println!("暂无试卷");
    }
    for quiz in quizzes {
        println!(
            "  [{}] {} · {} 题 · {}",
            quiz.id,
            truncate_text(&quiz.title, 40),
            quiz.question_count(),
            format_countdown(quiz.effective_duration())
        );
    }
    if meta.is_paginated() {
        println!("{}  (next / prev 翻页)", meta.label());
    }
    if is_admin {
        println!("管理员可使用 create 发布新试卷");
    }
}

pub fn print_exam_intro(quiz: &Quiz) {
    println!("\n📝 {}", quiz.title);
    for (idx, question) in quiz.questions.iter().enumerate() {
        println!("{}. {}", idx + 1, question.question_text);
        for (opt, text) in question.options.iter().enumerate() {
            let label = OPTION_LABELS.get(opt).copied().unwrap_or('?');
            println!("   {}. {}", label, text);
        }
    }
    println!("输入 a <题号> <选项> 作答，s 交卷，q 离开\n");
}

/// 时间以外的内容变化时刷新；计时本身每 30 秒刷新，最后 30 秒每 5 秒刷新
pub fn should_render(prev: Option<&ExamSnapshot>, next: &ExamSnapshot) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    let changed = prev.signal != next.signal
        || prev.camera != next.camera
        || prev.answers != next.answers
        || prev.phase != next.phase
        || prev.error != next.error
        || prev.pending_score != next.pending_score;
    if changed {
        return true;
    }
    prev.time_left != next.time_left
        && (next.time_left % 30 == 0 || (next.timer_warning && next.time_left % 5 == 0))
}

/// 考试状态文本
pub fn format_snapshot(snapshot: &ExamSnapshot, question_count: usize) -> String {
    let warning = if snapshot.timer_warning { "⚠️" } else { "⏱" };
    let camera = match &snapshot.camera {
        CameraStatus::Active => "📷 已开启",
        CameraStatus::Requesting => "📷 请求中",
        CameraStatus::Denied(_) => "📷 未开启",
        CameraStatus::Released => "📷 已关闭",
    };
    let mut lines = vec![format!(
        "{} {} | 已答 {}/{} | 全屏 {} | {}",
        warning,
        format_countdown(snapshot.time_left),
        snapshot.answers.len(),
        question_count,
        if snapshot.signal.is_fullscreen { "✓" } else { "✗" },
        camera
    )];

    if let Some(banner) = snapshot.camera.blocking_banner() {
        lines.push(format!("🚫 {}", banner));
    }
    if snapshot.phase == ExamPhase::InProgress && !snapshot.controls_enabled() {
        lines.push("🔒 作答与交卷已禁用".to_string());
    }
    if snapshot.phase == ExamPhase::InProgress {
        if let Some(banner) = snapshot.signal.warning_banner() {
            lines.push(format!("⚠️ {}", banner));
        }
    }
    if snapshot.phase == ExamPhase::Submitting {
        lines.push("📤 正在提交...".to_string());
    }
    if let Some(error) = &snapshot.error {
        lines.push(format!("❌ {}", error));
    }
    lines.join("\n")
}

pub fn print_exam_outcome(quiz: &Quiz, outcome: &ExamOutcome) {
    match outcome {
        ExamOutcome::Submitted { score, .. } => {
            println!("\n{}", "=".repeat(40));
            println!("🎉 {} 已完成", quiz.title);
            println!("得分: {}% · {}", score, ScoreBand::of(*score).remark());
            println!("{}", "=".repeat(40));
        }
        ExamOutcome::Terminated { violation, .. } => {
            println!("\n⛔ {}", violation.alert_message());
            println!("原因: {}", violation.describe());
        }
        ExamOutcome::Left => println!("已离开考试，本次作答未提交"),
    }
}

/// 成绩列表，`title` 为空时显示试卷 ID
pub fn print_results<'r>(
    rows: &[&'r QuizResult],
    title: impl Fn(&'r QuizResult) -> Option<String>,
    meta: &PageMeta,
    is_admin: bool,
    filter: &ResultFilter,
) {
    if is_admin && !filter.is_empty() {
        println!(
            "筛选: 试卷={} 用户={}",
            filter.quiz_id.as_deref().unwrap_or("*"),
            filter.user_query.as_deref().unwrap_or("*")
        );
    }
    if rows.is_empty() {
        println!("暂无成绩");
    }
    for row in rows.iter().copied() {
        let name = title(row).unwrap_or_else(|| row.quiz_id.clone());
        let band = ScoreBand::of(row.score);
        if is_admin {
            println!(
                "  {} · {} · {}% {}",
                row.user_id,
                truncate_text(&name, 30),
                row.score,
                band.remark()
            );
        } else {
            println!("  {} · {}% {}", truncate_text(&name, 30), row.score, band.remark());
        }
    }
    if meta.is_paginated() {
        println!("{}", meta.label());
    }
}

pub fn print_profile(profile: &Profile, source: Option<ProfileSource>) {
    let origin = match source {
        Some(ProfileSource::Server) => "服务端",
        Some(ProfileSource::Cache) => "本地缓存",
        Some(ProfileSource::Registration) => "注册信息",
        Some(ProfileSource::Default) => "默认",
        None => "编辑中",
    };
    println!("个人资料 ({})", origin);
    println!("  姓名: {}", profile.full_name);
    println!("  邮箱: {}", profile.email);
    println!("  电话: {}", profile.phone);
    println!("  学校: {}", profile.institution);
}

pub fn print_publish_reports(reports: &[PublishReport]) {
    if reports.is_empty() {
        println!("没有找到可发布的草稿");
    }
    for report in reports {
        let source = report.source.as_deref().unwrap_or("-");
        match &report.result {
            Ok(_) => println!("  ✓ {} ({})", report.title, source),
            Err(e) => println!("  ✗ {} ({}): {}", report.title, source, e.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::{AnswerSet, IntegritySignal};

    fn snapshot(time_left: u32) -> ExamSnapshot {
        ExamSnapshot {
            time_left,
            timer_warning: time_left <= 30,
            signal: IntegritySignal {
                is_fullscreen: true,
                webcam_active: true,
                ..Default::default()
            },
            camera: CameraStatus::Active,
            answers: AnswerSet::new(),
            phase: ExamPhase::InProgress,
            error: None,
            pending_score: None,
        }
    }

    #[test]
    fn test_should_render_throttles_timer() {
        assert!(should_render(None, &snapshot(100)));
        assert!(!should_render(Some(&snapshot(100)), &snapshot(99)));
        assert!(should_render(Some(&snapshot(91)), &snapshot(90)));
        assert!(should_render(Some(&snapshot(26)), &snapshot(25)));
        assert!(!should_render(Some(&snapshot(25)), &snapshot(24)));

        let mut next = snapshot(99);
        next.signal.tab_hidden = true;
        assert!(should_render(Some(&snapshot(100)), &next));
    }

    #[test]
    fn test_format_snapshot_banners() {
        let mut s = snapshot(65);
        assert_eq!(format_snapshot(&s, 4), "⏱ 01:05 | 已答 0/4 | 全屏 ✓ | 📷 已开启");

        s.camera = CameraStatus::Denied("需要开启摄像头才能参加考试。".to_string());
        s.signal.webcam_active = false;
        s.signal.is_fullscreen = false;
        s.signal.fullscreen_exit_count = 1;
        let text = format_snapshot(&s, 4);
        assert!(text.contains("需要开启摄像头才能参加考试。"));
        assert!(text.contains("请在考试期间保持全屏。（已检测到退出 1 次）"));

        s.camera = CameraStatus::Requesting;
        let text = format_snapshot(&s, 4);
        assert!(text.contains("🚫 请开启摄像头后继续。"));
        assert!(text.contains("🔒 作答与交卷已禁用"));

        s.camera = CameraStatus::Released;
        s.phase = ExamPhase::Submitted { score: 80 };
        let text = format_snapshot(&s, 4);
        assert!(!text.contains("🚫"));
        assert!(!text.contains("🔒"));
    }
}
