//! 日志初始化
//!
//! 默认级别为 info，`VERBOSE_LOGGING=true` 时为 debug，`RUST_LOG` 优先

use tracing_subscriber::EnvFilter;

fn build_filter() -> EnvFilter {
    let verbose = std::env::var("VERBOSE_LOGGING")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// 初始化全局日志订阅器
///
/// 日志写入 stderr，stdout 留给交互界面
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 允许重复初始化（测试中使用）
pub fn try_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_target(false)
        .with_test_writer()
        .try_init();
}
