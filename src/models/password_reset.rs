use serde::{Deserialize, Serialize};

/// 申请验证码
#[derive(Debug, Clone, Serialize)]
pub struct OtpRequest {
    pub email: String,
}

/// 校验验证码
#[derive(Debug, Clone, Serialize)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub otp: String,
}

/// 重置密码
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// 找回密码接口的通用响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetResponse {
    #[serde(default)]
    pub message: String,
    /// 服务端以字符串 "true"/"false" 返回
    #[serde(default)]
    pub verified: Option<String>,
}

impl ResetResponse {
    pub fn is_verified(&self) -> bool {
        self.verified.as_deref() == Some("true")
    }
}
