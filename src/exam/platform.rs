//! 监考平台能力抽象
//!
//! 考试会话只依赖这组能力：全屏控制、摄像头采集、全屏/可见性事件订阅。
//! 真实实现见 `browser::BrowserPlatform`，测试中使用假实现。

use tokio::sync::mpsc;

use crate::error::AppResult;

/// 平台事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// 全屏状态变化
    FullscreenChanged { fullscreen: bool },
    /// 标签页可见性变化
    VisibilityChanged { hidden: bool },
}

/// 监考平台
#[allow(async_fn_in_trait)]
pub trait ExamPlatform {
    /// 会话开始时页面是否已处于全屏（此时不会再收到进入全屏的事件）
    fn starts_fullscreen(&self) -> bool {
        false
    }

    /// 请求进入全屏
    async fn enter_fullscreen(&self) -> AppResult<()>;

    /// 请求退出全屏
    async fn exit_fullscreen(&self) -> AppResult<()>;

    /// 请求摄像头（仅视频）并绑定到预览区域，失败时返回面向用户的原因
    async fn request_camera(&self) -> Result<(), String>;

    /// 停止所有采集轨道
    ///
    /// 同步调用：会话的任何退出路径（包括 future 被丢弃）都必须能执行
    fn release_camera(&self);

    /// 订阅全屏与可见性事件，每个会话调用一次
    fn subscribe(&self) -> mpsc::UnboundedReceiver<PlatformEvent>;
}
