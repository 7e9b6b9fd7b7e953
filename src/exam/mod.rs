//! 考试会话核心
//!
//! - `timer` - 倒计时
//! - `integrity` - 全屏与标签页监控
//! - `camera` - 摄像头门禁与释放守卫
//! - `answers` - 作答记录与评分
//! - `submission` - 交卷互斥与上报重试
//! - `platform` - 监考平台能力抽象
//! - `session` - 状态机与会话运行循环

pub mod answers;
pub mod camera;
pub mod integrity;
pub mod platform;
pub mod session;
pub mod submission;
pub mod timer;

pub use answers::AnswerSet;
pub use camera::{CameraGate, CameraLease, CameraStatus};
pub use integrity::{FullscreenMonitor, IntegritySignal, Violation, VisibilityMonitor};
pub use platform::{ExamPlatform, PlatformEvent};
pub use session::{
    ExamCommand, ExamOutcome, ExamPhase, ExamSession, ExamSettings, ExamSnapshot, ExamState,
};
pub use submission::{report_with_retry, ResultReporter, Submission, SubmissionPhase, SubmitTrigger};
pub use timer::{Countdown, Tick};
