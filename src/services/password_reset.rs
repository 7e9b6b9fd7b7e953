//! 找回密码 - 业务能力层
//!
//! 三步流程：邮箱 → 验证码 → 新密码

use regex::Regex;
use tracing::info;

use crate::clients::QuizApiClient;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::password_reset::{ResetPasswordRequest, ResetResponse};

/// 验证码位数
pub const OTP_LENGTH: usize = 6;
/// 新密码最短长度
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// 找回密码接口
#[allow(async_fn_in_trait)]
pub trait PasswordResetApi {
    async fn request_otp(&self, email: &str) -> AppResult<ResetResponse>;
    async fn verify_otp(&self, email: &str, otp: &str) -> AppResult<ResetResponse>;
    async fn reset_password(&self, request: &ResetPasswordRequest) -> AppResult<ResetResponse>;
}

impl PasswordResetApi for QuizApiClient {
    async fn request_otp(&self, email: &str) -> AppResult<ResetResponse> {
        QuizApiClient::request_otp(self, email).await
    }

    async fn verify_otp(&self, email: &str, otp: &str) -> AppResult<ResetResponse> {
        QuizApiClient::verify_otp(self, email, otp).await
    }

    async fn reset_password(&self, request: &ResetPasswordRequest) -> AppResult<ResetResponse> {
        QuizApiClient::reset_password(self, request).await
    }
}

/// 当前步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    Email,
    Otp,
    NewPassword,
    Done,
}

/// 去掉非数字字符并截断到验证码长度
pub fn sanitize_otp(raw: &str) -> String {
    let digits = match Regex::new(r"\D") {
        Ok(re) => re.replace_all(raw, "").into_owned(),
        Err(_) => raw.chars().filter(char::is_ascii_digit).collect(),
    };
    digits.chars().take(OTP_LENGTH).collect()
}

pub fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if otp.len() == OTP_LENGTH && otp.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidOtp)
    }
}

pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// 找回密码流程
pub struct PasswordReset<A: PasswordResetApi = QuizApiClient> {
    api: A,
    step: ResetStep,
    email: String,
    otp: String,
}

impl<A: PasswordResetApi> PasswordReset<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            step: ResetStep::Email,
            email: String::new(),
            otp: String::new(),
        }
    }

    pub fn step(&self) -> ResetStep {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// 第一步：发送验证码，返回服务端提示
    pub async fn submit_email(&mut self, email: &str) -> AppResult<String> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField("邮箱").into());
        }
        let response = self.api.request_otp(email).await?;
        info!("验证码已发送: {}", email);
        self.email = email.to_string();
        self.step = ResetStep::Otp;
        Ok(response.message)
    }

    /// 第二步：校验验证码
    pub async fn submit_otp(&mut self, raw: &str) -> AppResult<String> {
        let otp = sanitize_otp(raw);
        validate_otp(&otp)?;
        let response = self.api.verify_otp(&self.email, &otp).await?;
        if !response.is_verified() {
            let message = if response.message.is_empty() {
                "验证码无效或已过期".to_string()
            } else {
                response.message
            };
            return Err(AppError::Other(message));
        }
        self.otp = otp;
        self.step = ResetStep::NewPassword;
        Ok(response.message)
    }

    /// 第三步：设置新密码
    pub async fn submit_password(&mut self, password: &str, confirm: &str) -> AppResult<String> {
        validate_new_password(password, confirm)?;
        let request = ResetPasswordRequest {
            email: self.email.clone(),
            otp: self.otp.clone(),
            new_password: password.to_string(),
        };
        let response = self.api.reset_password(&request).await?;
        info!("✓ 密码已重置: {}", self.email);
        self.step = ResetStep::Done;
        Ok(response.message)
    }

    /// 返回上一步
    pub fn back(&mut self) {
        self.step = match self.step {
            ResetStep::Otp => ResetStep::Email,
            ResetStep::NewPassword => ResetStep::Otp,
            other => other,
        };
    }
}
