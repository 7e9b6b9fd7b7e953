//! 摄像头门禁
//!
//! 没有正在采集的摄像头时，禁止作答与手动提交。

use tracing::debug;

use crate::error::ExamError;
use crate::exam::platform::ExamPlatform;

/// 摄像头状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraStatus {
    /// 正在请求授权
    Requesting,
    /// 采集中
    Active,
    /// 授权失败
    Denied(String),
    /// 已释放
    Released,
}

impl CameraStatus {
    /// 阻断横幅文案；采集中或已释放时没有横幅
    pub fn blocking_banner(&self) -> Option<String> {
        match self {
            CameraStatus::Active | CameraStatus::Released => None,
            CameraStatus::Denied(reason) if !reason.is_empty() => Some(reason.clone()),
            _ => Some("请开启摄像头后继续。".to_string()),
        }
    }
}

/// 摄像头门禁
#[derive(Debug, Clone)]
pub struct CameraGate {
    status: CameraStatus,
}

impl Default for CameraGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraGate {
    pub fn new() -> Self {
        Self {
            status: CameraStatus::Requesting,
        }
    }

    pub fn status(&self) -> &CameraStatus {
        &self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == CameraStatus::Active
    }

    /// 处理摄像头请求结果；释放之后到达的结果会被忽略
    pub fn on_request_result(&mut self, result: Result<(), String>) {
        if self.status == CameraStatus::Released {
            return;
        }
        self.status = match result {
            Ok(()) => CameraStatus::Active,
            Err(reason) => CameraStatus::Denied(reason),
        };
    }

    pub fn mark_released(&mut self) {
        self.status = CameraStatus::Released;
    }

    /// 作答与提交前的检查
    pub fn ensure_active(&self) -> Result<(), ExamError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(ExamError::CameraRequired)
        }
    }
}

/// 摄像头释放守卫
///
/// 显式调用 `release` 或被丢弃时停止采集，且只释放一次
pub struct CameraLease<'a, P: ExamPlatform> {
    platform: &'a P,
    released: bool,
}

impl<'a, P: ExamPlatform> CameraLease<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self {
            platform,
            released: false,
        }
    }

    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            debug!("释放摄像头");
            self.platform.release_camera();
        }
    }
}

impl<P: ExamPlatform> Drop for CameraLease<'_, P> {
    fn drop(&mut self) {
        self.release();
    }
}
