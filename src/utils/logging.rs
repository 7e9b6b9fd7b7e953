use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

/// 初始化监考事件日志文件
///
/// 文件已存在时保留原有记录，只在新文件中写入表头
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    if std::path::Path::new(log_file_path).exists() {
        return Ok(());
    }
    let log_header = format!(
        "{}\n监考事件日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str, fullscreen_limit: u32, tab_limit: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 在线测验客户端启动");
    info!("🌐 服务地址: {}", api_base_url);
    info!(
        "🛡️ 监考阈值: 退出全屏 {} 次 / 切换标签页 {} 次",
        fullscreen_limit, tab_limit
    );
    info!("{}", "=".repeat(60));
}

/// 记录考试开始信息
pub fn log_exam_start(quiz_id: &str, title: &str, question_count: usize, seconds: u32) {
    info!("\n{}", "=".repeat(60));
    info!("📝 开始考试: {} ({})", title, quiz_id);
    info!("📄 题目数量: {}，限时 {}", question_count, format_countdown(seconds));
    info!("{}", "=".repeat(60));
}

/// 将剩余秒数格式化为 MM:SS
pub fn format_countdown(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(240), "04:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(3725), "62:05");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("第一题：中国的首都", 4), "第一题：...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
