//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用主循环
//! - 管理应用生命周期（初始化、恢复登录、运行）
//! - 持有 API 客户端与各页面服务
//! - 把命令调度到对应页面，考试交给 `workflow::ExamFlow`
//!
//! ### `router` - 命令解析
//! - 把一行输入解析为 `Command`
//! - 标记需要登录的命令
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (命令调度)
//!     ↓
//! workflow::ExamFlow (一场考试)
//!     ↓
//! exam (会话状态机) / services (登录、试卷、成绩、资料)
//!     ↓
//! browser / infrastructure (监考页面) · clients (REST API)
//! ```

pub mod app;
pub mod router;

pub use app::App;
pub use router::{Command, FilterArg};
