use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    Student,
}

impl Role {
    /// 获取显示名称
    pub fn name(self) -> &'static str {
        match self {
            Role::Admin => "管理员",
            Role::Student => "学生",
        }
    }
}

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// 登录请求
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 注册请求，角色固定为学生
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub email: String,
}

impl RegisterRequest {
    pub fn student(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role: Role::Student,
            email: email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        let user: User =
            serde_json::from_str(r#"{"id":"u1","username":"root","role":"ADMIN"}"#).unwrap();
        assert!(user.is_admin());
        assert_eq!(user.email, None);

        let body = serde_json::to_value(RegisterRequest::student("amy", "secret", "a@b.c")).unwrap();
        assert_eq!(body["role"], "STUDENT");
        assert_eq!(body["email"], "a@b.c");
    }
}
