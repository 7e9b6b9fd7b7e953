//! JS 执行器 - 基础设施层
//!
//! 持有监考页面，只暴露"执行 JS"的能力

use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult, BrowserError};

/// JS 执行器
///
/// 不认识考试、题目，只负责在页面里执行脚本。`Page` 内部是共享句柄，
/// 克隆后可以交给后台任务使用。
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        result.into_value().map_err(script_error)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(script_error)
    }

    /// 以用户手势执行脚本
    ///
    /// `requestFullscreen` 之类的接口只允许在用户手势中调用
    pub async fn eval_with_gesture<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> AppResult<T> {
        let params = EvaluateParams::builder()
            .expression(js_code.into())
            .user_gesture(true)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|e| AppError::Browser(BrowserError::ConfigurationFailed(e)))?;
        let result = self.page.evaluate(params).await?;
        result.into_value().map_err(script_error)
    }
}

fn script_error(err: serde_json::Error) -> AppError {
    AppError::Browser(BrowserError::ScriptExecutionFailed {
        source: Box::new(err),
    })
}
