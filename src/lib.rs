//! # Quiz Proctor
//!
//! 带监考能力的在线测验终端客户端
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - `JsExecutor` 持有监考页面，只暴露执行脚本的能力
//! - `browser/` - 连接或启动浏览器，`BrowserPlatform` 提供全屏、摄像头与可见性事件
//! - `clients/` - `QuizApiClient` 封装 REST 接口，会话通过 Cookie 维持
//!
//! ### ② 考试核心（Exam）
//! - `exam/` - 倒计时、全屏与标签页监控、摄像头门禁、评分与交卷
//! - `ExamSession` 在单个任务中用 `select!` 驱动状态机
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 登录会话、试卷列表与发布、成绩、个人资料、找回密码、监考记录
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 一场考试的完整流程（打开页面 → 会话 → 记录 → 结果）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/` - 命令解析与主循环
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod exam;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod ui;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::BrowserPlatform;
pub use clients::QuizApiClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use exam::{ExamCommand, ExamOutcome, ExamPlatform, ExamSession, ExamSettings, ResultReporter};
pub use infrastructure::JsExecutor;
pub use orchestrator::App;
pub use workflow::{ExamFlow, ExamReport};
