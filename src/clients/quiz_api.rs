/// 测验平台 API 客户端
///
/// 封装所有 REST 调用，会话通过 Cookie 维持
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::page::Listing;
use crate::models::password_reset::{OtpRequest, OtpVerifyRequest, ResetPasswordRequest, ResetResponse};
use crate::models::{
    CreateQuizRequest, Profile, Quiz, QuizPage, QuizResult, ResultPage, ResultSubmission, User,
};
use crate::models::user::{LoginRequest, RegisterRequest};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// 测验平台 API 客户端
#[derive(Clone)]
pub struct QuizApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl QuizApiClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 单张试卷的地址，试卷 ID 作为一个路径段编码
    fn quiz_url(&self, quiz_id: &str) -> AppResult<reqwest::Url> {
        let base = self.url("/api/quizzes");
        let mut url = reqwest::Url::parse(&base)
            .map_err(|e| AppError::Config(format!("无效的 API 地址 {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("无效的 API 地址 {}", base)))?
            .push(quiz_id);
        Ok(url)
    }

    // ========== 认证 ==========

    /// 登录，成功后服务端写入会话 Cookie
    pub async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let endpoint = "/api/auth/login";
        self.send_json(self.http.post(self.url(endpoint)).json(&body), endpoint)
            .await
    }

    /// 注册学生账号，返回服务端提示
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<String> {
        let endpoint = "/api/auth/register";
        self.send_text(self.http.post(self.url(endpoint)).json(request), endpoint)
            .await
    }

    pub async fn logout(&self) -> AppResult<()> {
        let endpoint = "/api/auth/logout";
        self.send_text(self.http.post(self.url(endpoint)), endpoint)
            .await
            .map(|_| ())
    }

    /// 查询服务端会话中的当前用户
    pub async fn current_user(&self) -> AppResult<User> {
        let endpoint = "/api/auth/current";
        self.send_json(self.http.get(self.url(endpoint)), endpoint)
            .await
    }

    // ========== 试卷 ==========

    /// 分页获取试卷列表（页码从 0 开始）
    pub async fn list_quizzes(&self, page: u32, size: u32) -> AppResult<QuizPage> {
        let endpoint = "/api/quizzes";
        let listing: Listing<QuizPage, Quiz> = self
            .send_json(
                self.http
                    .get(self.url(endpoint))
                    .query(&[("page", page), ("size", size)]),
                endpoint,
            )
            .await?;
        Ok(listing.resolve(|quizzes, meta| QuizPage { quizzes, meta }))
    }

    pub async fn get_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        let url = self.quiz_url(quiz_id)?;
        let endpoint = url.path().to_string();
        self.send_json(self.http.get(url), &endpoint).await
    }

    /// 创建试卷（仅管理员）
    pub async fn create_quiz(&self, request: &CreateQuizRequest) -> AppResult<String> {
        let endpoint = "/api/quizzes";
        self.send_text(self.http.post(self.url(endpoint)).json(request), endpoint)
            .await
    }

    // ========== 成绩 ==========

    pub async fn submit_result(&self, submission: &ResultSubmission) -> AppResult<()> {
        let endpoint = "/api/results/submit";
        debug!("上报成绩 Payload: {:?}", submission);
        self.send_text(self.http.post(self.url(endpoint)).json(submission), endpoint)
            .await
            .map(|_| ())
    }

    pub async fn my_results(&self, page: u32, size: u32) -> AppResult<ResultPage> {
        self.list_results("/api/results/my-results", page, size).await
    }

    /// 全部成绩（仅管理员）
    pub async fn all_results(&self, page: u32, size: u32) -> AppResult<ResultPage> {
        self.list_results("/api/results/all", page, size).await
    }

    async fn list_results(&self, endpoint: &str, page: u32, size: u32) -> AppResult<ResultPage> {
        let listing: Listing<ResultPage, QuizResult> = self
            .send_json(
                self.http
                    .get(self.url(endpoint))
                    .query(&[("page", page), ("size", size)]),
                endpoint,
            )
            .await?;
        Ok(listing.resolve(|results, meta| ResultPage { results, meta }))
    }

    // ========== 个人资料 ==========

    pub async fn get_profile(&self) -> AppResult<Profile> {
        let endpoint = "/api/profile";
        self.send_json(self.http.get(self.url(endpoint)), endpoint)
            .await
    }

    pub async fn create_profile(&self, profile: &Profile) -> AppResult<()> {
        let endpoint = "/api/profile";
        self.send_text(self.http.post(self.url(endpoint)).json(profile), endpoint)
            .await
            .map(|_| ())
    }

    pub async fn update_profile(&self, profile: &Profile) -> AppResult<()> {
        let endpoint = "/api/profile";
        self.send_text(self.http.put(self.url(endpoint)).json(profile), endpoint)
            .await
            .map(|_| ())
    }

    // ========== 找回密码 ==========

    pub async fn request_otp(&self, email: &str) -> AppResult<ResetResponse> {
        let endpoint = "/api/password-reset/request";
        let body = OtpRequest {
            email: email.to_string(),
        };
        self.send_json(self.http.post(self.url(endpoint)).json(&body), endpoint)
            .await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> AppResult<ResetResponse> {
        let endpoint = "/api/password-reset/verify";
        let body = OtpVerifyRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        self.send_json(self.http.post(self.url(endpoint)).json(&body), endpoint)
            .await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> AppResult<ResetResponse> {
        let endpoint = "/api/password-reset/reset";
        self.send_json(self.http.post(self.url(endpoint)).json(request), endpoint)
            .await
    }

    // ========== 辅助函数 ==========

    /// 发送请求并反序列化 JSON 响应
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> AppResult<T> {
        let body = self.send_text(request, endpoint).await?;
        if body.trim().is_empty() {
            return Err(AppError::Api(ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            }));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// 发送请求并返回原始响应文本，非 2xx 视为失败
    async fn send_text(&self, request: RequestBuilder, endpoint: &str) -> AppResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if status.is_success() {
            return Ok(body);
        }

        warn!("API 返回错误 {} ({}): {}", status, endpoint, body);
        Err(AppError::Api(classify_failure(endpoint, status, &body)))
    }
}

/// 将非 2xx 响应转换为 ApiError
pub(crate) fn classify_failure(endpoint: &str, status: StatusCode, body: &str) -> ApiError {
    if status == StatusCode::UNAUTHORIZED && body.trim().is_empty() {
        return ApiError::Unauthorized {
            endpoint: endpoint.to_string(),
        };
    }
    let message = extract_error_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("请求失败").to_string());
    ApiError::BadResponse {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    }
}

/// 从错误响应体中提取提示：优先 JSON 的 message 字段，其次纯文本
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        Ok(Value::String(s)) => Some(s),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"message":"No account found with this email address"}"#),
            Some("No account found with this email address".to_string())
        );
        assert_eq!(
            extract_error_message("Username already exists"),
            Some("Username already exists".to_string())
        );
        assert_eq!(extract_error_message("   "), None);
        assert_eq!(extract_error_message(r#"{"error":"x"}"#), None);
    }

    #[test]
    fn test_classify_failure() {
        let err = classify_failure("/api/auth/current", StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, ApiError::Unauthorized { .. }));

        let err = classify_failure(
            "/api/quizzes",
            StatusCode::UNAUTHORIZED,
            "Unauthorized: Only admin can create quiz",
        );
        match err {
            ApiError::BadResponse { status, message, .. } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized: Only admin can create quiz");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let err = classify_failure("/api/quizzes/x", StatusCode::NOT_FOUND, "");
        match err {
            ApiError::BadResponse { message, .. } => assert_eq!(message, "Not Found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let config = Config {
            api_base_url: "http://localhost:8080/".to_string(),
            ..Config::default()
        };
        let client = QuizApiClient::new(&config).unwrap();
        assert_eq!(client.url("/api/quizzes"), "http://localhost:8080/api/quizzes");
    }

    #[test]
    fn test_quiz_id_is_a_single_path_segment() {
        let client = QuizApiClient::new(&Config::default()).unwrap();
        assert_eq!(
            client.quiz_url("q-7").unwrap().as_str(),
            "http://localhost:8080/api/quizzes/q-7"
        );
        let url = client.quiz_url("a/b?c#d").unwrap();
        assert_eq!(url.path(), "/api/quizzes/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }
}
