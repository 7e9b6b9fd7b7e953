/// 浏览器接入方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowserMode {
    /// 连接已开启远程调试端口的浏览器
    Connect,
    /// 启动无头浏览器
    Headless,
}

impl std::str::FromStr for BrowserMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "connect" => Ok(BrowserMode::Connect),
            "headless" => Ok(BrowserMode::Headless),
            other => Err(format!("未知的浏览器模式: {}", other)),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端 REST API 地址
    pub api_base_url: String,
    /// 列表分页大小
    pub page_size: u32,
    // --- 浏览器配置 ---
    pub browser_mode: BrowserMode,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 无头模式下的浏览器可执行文件
    pub browser_executable: Option<String>,
    /// 监考页面
    pub exam_page_url: String,
    // --- 考试监控配置 ---
    /// 退出全屏次数上限
    pub fullscreen_exit_limit: u32,
    /// 切换标签页次数上限
    pub tab_switch_limit: u32,
    /// 浏览器事件拉取间隔（毫秒）
    pub event_poll_interval_ms: u64,
    /// 成绩上报最大尝试次数
    pub submit_max_retries: usize,
    /// 成绩上报重试间隔（毫秒）
    pub submit_retry_delay_ms: u64,
    // --- 本地缓存 ---
    pub session_cache_path: String,
    pub profile_cache_dir: String,
    /// 待发布试卷的 TOML 目录
    pub quiz_draft_folder: String,
    /// 监考事件日志
    pub incident_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 管理员查看成绩时并发拉取试卷标题的数量
    pub title_fetch_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            page_size: 10,
            browser_mode: BrowserMode::Connect,
            browser_debug_port: 9222,
            browser_executable: None,
            exam_page_url: "about:blank".to_string(),
            fullscreen_exit_limit: 3,
            tab_switch_limit: 2,
            event_poll_interval_ms: 200,
            submit_max_retries: 3,
            submit_retry_delay_ms: 2000,
            session_cache_path: ".quiz_session.json".to_string(),
            profile_cache_dir: ".quiz_profiles".to_string(),
            quiz_draft_folder: "quiz_drafts".to_string(),
            incident_log_file: "incidents.txt".to_string(),
            verbose_logging: false,
            title_fetch_concurrency: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 按给定的查找函数覆盖默认值，解析失败的项保留默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            api_base_url: lookup("API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.api_base_url),
            page_size: lookup("PAGE_SIZE").and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(default.page_size),
            browser_mode: lookup("BROWSER_MODE").and_then(|v| v.parse().ok()).unwrap_or(default.browser_mode),
            browser_debug_port: lookup("BROWSER_DEBUG_PORT").and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            browser_executable: lookup("BROWSER_EXECUTABLE").or(default.browser_executable),
            exam_page_url: lookup("EXAM_PAGE_URL").unwrap_or(default.exam_page_url),
            fullscreen_exit_limit: lookup("FULLSCREEN_EXIT_LIMIT").and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(default.fullscreen_exit_limit),
            tab_switch_limit: lookup("TAB_SWITCH_LIMIT").and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(default.tab_switch_limit),
            event_poll_interval_ms: lookup("EVENT_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()).unwrap_or(default.event_poll_interval_ms),
            submit_max_retries: lookup("SUBMIT_MAX_RETRIES").and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(default.submit_max_retries),
            submit_retry_delay_ms: lookup("SUBMIT_RETRY_DELAY_MS").and_then(|v| v.parse().ok()).unwrap_or(default.submit_retry_delay_ms),
            session_cache_path: lookup("SESSION_CACHE_PATH").unwrap_or(default.session_cache_path),
            profile_cache_dir: lookup("PROFILE_CACHE_DIR").unwrap_or(default.profile_cache_dir),
            quiz_draft_folder: lookup("QUIZ_DRAFT_FOLDER").unwrap_or(default.quiz_draft_folder),
            incident_log_file: lookup("INCIDENT_LOG_FILE").unwrap_or(default.incident_log_file),
            verbose_logging: lookup("VERBOSE_LOGGING").and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            title_fetch_concurrency: lookup("TITLE_FETCH_CONCURRENCY").and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(default.title_fetch_concurrency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_keep_literal_thresholds() {
        let config = Config::default();
        assert_eq!(config.fullscreen_exit_limit, 3);
        assert_eq!(config.tab_switch_limit, 2);
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_lookup_overrides_and_bad_values() {
        let env: HashMap<&str, &str> = [
            ("API_BASE_URL", "https://quiz.example.com/"),
            ("PAGE_SIZE", "abc"),
            ("BROWSER_MODE", "Headless"),
            ("TAB_SWITCH_LIMIT", "0"),
            ("FULLSCREEN_EXIT_LIMIT", "5"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "https://quiz.example.com");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.browser_mode, BrowserMode::Headless);
        assert_eq!(config.tab_switch_limit, 2);
        assert_eq!(config.fullscreen_exit_limit, 5);
    }
}
