//! 浏览器接入
//!
//! 监考能力（全屏、摄像头、可见性事件）通过真实浏览器页面提供

pub mod connection;
pub mod headless;
pub mod platform;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_headless_browser;
pub use platform::BrowserPlatform;

use chromiumoxide::{Browser, Page};

use crate::config::{BrowserMode, Config};
use crate::error::AppResult;

/// 按配置打开监考页面
pub async fn open_exam_page(config: &Config) -> AppResult<(Browser, Page)> {
    match config.browser_mode {
        BrowserMode::Connect => {
            connect_to_browser_and_page(config.browser_debug_port, &config.exam_page_url).await
        }
        BrowserMode::Headless => {
            launch_headless_browser(config.browser_executable.as_deref(), &config.exam_page_url)
                .await
        }
    }
}
