//! 基于浏览器页面的监考平台
//!
//! 页面内的监听器把全屏、可见性变化压入 `window.__examEvents`，
//! 后台任务按固定间隔取出并转发给考试会话。

use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::exam::{ExamPlatform, PlatformEvent};
use crate::infrastructure::JsExecutor;

const CAMERA_DENIED: &str = "需要开启摄像头才能参加考试。";
const CAMERA_UNSUPPORTED: &str = "当前浏览器不支持摄像头采集。";

/// 连续拉取失败多少次后停止拉取
const MAX_POLL_FAILURES: u32 = 5;

const INSTALL_LISTENERS_JS: &str = r#"
(() => {
    window.__examEvents = [];
    window.__examReleased = false;
    if (!window.__examListeners) {
        window.__examListeners = true;
        document.addEventListener('fullscreenchange', () => {
            window.__examEvents.push({ kind: 'fullscreen', value: !!document.fullscreenElement });
        });
        document.addEventListener('visibilitychange', () => {
            window.__examEvents.push({ kind: 'visibility', value: document.hidden });
        });
    }
    return !!document.fullscreenElement;
})()
"#;

const DRAIN_EVENTS_JS: &str = "(window.__examEvents || []).splice(0)";

const ENTER_FULLSCREEN_JS: &str = r#"
(async () => {
    if (document.fullscreenElement) return { ok: true };
    try {
        await document.documentElement.requestFullscreen();
        return { ok: true };
    } catch (e) {
        return { ok: false, error: String(e && e.message ? e.message : e) };
    }
})()
"#;

const EXIT_FULLSCREEN_JS: &str = r#"
(async () => {
    if (!document.fullscreenElement) return { ok: true };
    try {
        await document.exitFullscreen();
        return { ok: true };
    } catch (e) {
        return { ok: false, error: String(e && e.message ? e.message : e) };
    }
})()
"#;

const REQUEST_CAMERA_JS: &str = r#"
(async () => {
    if (!navigator.mediaDevices || !navigator.mediaDevices.getUserMedia) {
        return { ok: false, error: 'unsupported' };
    }
    try {
        const stream = await navigator.mediaDevices.getUserMedia({ video: true, audio: false });
        if (window.__examReleased) {
            stream.getTracks().forEach(t => t.stop());
            return { ok: false, error: 'released' };
        }
        window.__examStream = stream;
        let video = document.getElementById('__exam_webcam');
        if (!video) {
            video = document.createElement('video');
            video.id = '__exam_webcam';
            video.autoplay = true;
            video.muted = true;
            video.playsInline = true;
            video.style.cssText = 'position:fixed;right:12px;bottom:12px;width:200px;z-index:2147483647';
            document.body.appendChild(video);
        }
        video.srcObject = stream;
        return { ok: true };
    } catch (e) {
        return { ok: false, error: String(e && e.name ? e.name : e) };
    }
})()
"#;

const RELEASE_CAMERA_JS: &str = r#"
(() => {
    window.__examReleased = true;
    const stream = window.__examStream;
    if (stream) stream.getTracks().forEach(t => t.stop());
    window.__examStream = null;
    const video = document.getElementById('__exam_webcam');
    if (video) { video.srcObject = null; video.remove(); }
    return true;
})()
"#;

/// 页面脚本返回的执行结果
#[derive(Debug, Deserialize)]
struct ScriptOutcome {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// 页面内记录的原始事件
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawEvent {
    Fullscreen { value: bool },
    Visibility { value: bool },
}

impl From<RawEvent> for PlatformEvent {
    fn from(raw: RawEvent) -> Self {
        match raw {
            RawEvent::Fullscreen { value } => PlatformEvent::FullscreenChanged { fullscreen: value },
            RawEvent::Visibility { value } => PlatformEvent::VisibilityChanged { hidden: value },
        }
    }
}

/// 解析一批事件，无法识别的条目跳过
fn parse_events(batch: serde_json::Value) -> Vec<PlatformEvent> {
    match batch {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<RawEvent>(item) {
                Ok(raw) => Some(raw.into()),
                Err(e) => {
                    debug!("跳过无法识别的页面事件: {}", e);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn camera_error_message(error: Option<&str>) -> String {
    match error {
        Some("unsupported") => CAMERA_UNSUPPORTED.to_string(),
        _ => CAMERA_DENIED.to_string(),
    }
}

/// 浏览器监考平台
pub struct BrowserPlatform {
    executor: JsExecutor,
    poll_interval: Duration,
    /// 安装监听器时页面已处于全屏
    initial_fullscreen: bool,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl BrowserPlatform {
    /// 在页面上安装监听器
    pub async fn attach(executor: JsExecutor, poll_interval: Duration) -> AppResult<Self> {
        let fullscreen: bool = executor.eval_as(INSTALL_LISTENERS_JS).await?;
        info!("🖥️ 监考监听器已安装 (当前全屏: {})", fullscreen);
        Ok(Self {
            executor,
            poll_interval,
            initial_fullscreen: fullscreen,
            poller: Mutex::new(None),
        })
    }

    async fn run_script(&self, js: &str) -> AppResult<()> {
        let outcome: ScriptOutcome = self.executor.eval_with_gesture(js).await?;
        if outcome.ok {
            Ok(())
        } else {
            Err(AppError::Other(outcome.error.unwrap_or_default()))
        }
    }

    /// 考试结束后等待页面完成清理
    pub async fn close(&self) {
        self.stop_poller();
        if let Err(e) = self.executor.eval(RELEASE_CAMERA_JS).await {
            warn!("清理监考页面失败: {}", e);
        }
    }

    fn stop_poller(&self) {
        if let Ok(mut guard) = self.poller.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl ExamPlatform for BrowserPlatform {
    fn starts_fullscreen(&self) -> bool {
        self.initial_fullscreen
    }

    async fn enter_fullscreen(&self) -> AppResult<()> {
        self.run_script(ENTER_FULLSCREEN_JS).await
    }

    async fn exit_fullscreen(&self) -> AppResult<()> {
        self.run_script(EXIT_FULLSCREEN_JS).await
    }

    async fn request_camera(&self) -> Result<(), String> {
        match self.executor.eval_as::<ScriptOutcome>(REQUEST_CAMERA_JS).await {
            Ok(outcome) if outcome.ok => Ok(()),
            Ok(outcome) => {
                debug!("摄像头请求被拒绝: {:?}", outcome.error);
                Err(camera_error_message(outcome.error.as_deref()))
            }
            Err(e) => {
                warn!("摄像头请求脚本执行失败: {}", e);
                Err(CAMERA_DENIED.to_string())
            }
        }
    }

    fn release_camera(&self) {
        self.stop_poller();
        let executor = self.executor.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = executor.eval(RELEASE_CAMERA_JS).await {
                        warn!("释放摄像头失败: {}", e);
                    }
                });
            }
            Err(_) => warn!("运行时已关闭，无法释放摄像头"),
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<PlatformEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let executor = self.executor.clone();
        let period = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut failures = 0;
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                match executor.eval(DRAIN_EVENTS_JS).await {
                    Ok(batch) => {
                        failures = 0;
                        for event in parse_events(batch) {
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        warn!("拉取页面事件失败 ({}/{}): {}", failures, MAX_POLL_FAILURES, e);
                        if failures >= MAX_POLL_FAILURES {
                            break;
                        }
                    }
                }
            }
            debug!("页面事件拉取已停止");
        });

        if let Ok(mut guard) = self.poller.lock() {
            if let Some(previous) = guard.replace(handle) {
                previous.abort();
            }
        }
        rx
    }
}

impl Drop for BrowserPlatform {
    fn drop(&mut self) {
        self.stop_poller();
    }
}
