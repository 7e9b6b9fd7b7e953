//! 登录会话 - 业务能力层
//!
//! 当前用户保存在内存和本地缓存文件中，由调用方显式持有

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::clients::QuizApiClient;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::user::RegisterRequest;
use crate::models::{Profile, User};
use crate::services::profile::ProfileCache;

/// 认证接口
#[allow(async_fn_in_trait)]
pub trait AuthApi {
    async fn login(&self, username: &str, password: &str) -> AppResult<User>;
    async fn register(&self, request: &RegisterRequest) -> AppResult<String>;
    async fn logout(&self) -> AppResult<()>;
    async fn current_user(&self) -> AppResult<User>;
}

impl AuthApi for QuizApiClient {
    async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        QuizApiClient::login(self, username, password).await
    }

    async fn register(&self, request: &RegisterRequest) -> AppResult<String> {
        QuizApiClient::register(self, request).await
    }

    async fn logout(&self) -> AppResult<()> {
        QuizApiClient::logout(self).await
    }

    async fn current_user(&self) -> AppResult<User> {
        QuizApiClient::current_user(self).await
    }
}

/// 当前用户缓存文件
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Option<User> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content)
            .map_err(|e| warn!("登录缓存已损坏，忽略: {}", e))
            .ok()
    }

    pub fn store(&self, user: &User) -> AppResult<()> {
        let content = serde_json::to_string_pretty(user)?;
        fs::write(&self.path, content)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))
    }

    pub fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("清除登录缓存失败: {}", e);
            }
        }
    }
}

/// 注册表单
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub email: String,
    /// 注册时顺带填写的资料
    pub profile: Profile,
}

/// 登录会话
pub struct AuthSession<A: AuthApi = QuizApiClient> {
    api: A,
    cache: SessionCache,
    profiles: ProfileCache,
    user: Option<User>,
}

impl<A: AuthApi> AuthSession<A> {
    pub fn new(api: A, cache: SessionCache, profiles: ProfileCache) -> Self {
        Self {
            api,
            cache,
            profiles,
            user: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    /// 需要登录的操作调用
    pub fn require_user(&self) -> Result<&User, ValidationError> {
        self.user.as_ref().ok_or(ValidationError::LoginRequired)
    }

    /// 恢复会话：先读本地缓存，再询问服务端
    pub async fn restore(&mut self) -> Option<&User> {
        if let Some(user) = self.cache.load() {
            debug!("从缓存恢复登录: {}", user.username);
            self.user = Some(user);
            return self.user.as_ref();
        }
        match self.api.current_user().await {
            Ok(user) => {
                info!("服务端会话有效: {}", user.username);
                self.remember(user);
            }
            Err(e) => debug!("没有可恢复的会话: {}", e),
        }
        self.user.as_ref()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> AppResult<&User> {
        if username.trim().is_empty() {
            return Err(ValidationError::MissingField("用户名").into());
        }
        if password.is_empty() {
            return Err(ValidationError::MissingField("密码").into());
        }
        let user = self.api.login(username.trim(), password).await?;
        info!("✓ 登录成功: {} ({})", user.username, user.role.name());
        self.remember(user);
        self.require_user().map_err(AppError::from)
    }

    /// 退出登录；服务端失败时保持登录状态
    pub async fn logout(&mut self) -> AppResult<()> {
        self.api.logout().await?;
        info!("已退出登录");
        self.user = None;
        self.cache.clear();
        Ok(())
    }

    /// 注册学生账号，返回服务端提示
    pub async fn register(&self, form: &RegistrationForm) -> AppResult<String> {
        let username = form.username.trim();
        if username.is_empty() {
            return Err(ValidationError::MissingField("用户名").into());
        }
        if form.password.is_empty() {
            return Err(ValidationError::MissingField("密码").into());
        }
        let request = RegisterRequest::student(username, form.password.clone(), form.email.trim());
        let message = self.api.register(&request).await?;
        info!("✓ 注册成功: {}", username);

        let mut profile = form.profile.clone();
        if profile.email.is_empty() {
            profile.email = form.email.trim().to_string();
        }
        if profile.has_any_field() {
            if let Err(e) = self.profiles.store_temp(username, &profile) {
                warn!("缓存注册资料失败: {}", e);
            }
        }
        Ok(message)
    }

    fn remember(&mut self, user: User) {
        if let Err(e) = self.cache.store(&user) {
            warn!("写入登录缓存失败: {}", e);
        }
        self.user = Some(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::Role;
    use crate::services::local_store::test_support::temp_dir;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeAuthApi {
        server_user: Option<User>,
        logout_fails: bool,
        registered: RefCell<Vec<RegisterRequest>>,
        current_calls: Cell<usize>,
    }

    fn student(name: &str) -> User {
        User {
            id: format!("id-{}", name),
            username: name.to_string(),
            email: None,
            role: Role::Student,
        }
    }

    impl AuthApi for FakeAuthApi {
        async fn login(&self, username: &str, password: &str) -> AppResult<User> {
            if password == "secret" {
                Ok(student(username))
            } else {
                Err(AppError::Api(ApiError::BadResponse {
                    endpoint: "/api/auth/login".to_string(),
                    status: 401,
                    message: "Invalid credentials".to_string(),
                }))
            }
        }

        async fn register(&self, request: &RegisterRequest) -> AppResult<String> {
            self.registered.borrow_mut().push(request.clone());
            Ok("User registered successfully".to_string())
        }

        async fn logout(&self) -> AppResult<()> {
            if self.logout_fails {
                Err(AppError::api_request_failed(
                    "/api/auth/logout",
                    std::io::Error::new(std::io::ErrorKind::Other, "offline"),
                ))
            } else {
                Ok(())
            }
        }

        async fn current_user(&self) -> AppResult<User> {
            self.current_calls.set(self.current_calls.get() + 1);
            self.server_user.clone().ok_or(AppError::Api(ApiError::Unauthorized {
                endpoint: "/api/auth/current".to_string(),
            }))
        }
    }

    fn session(name: &str, api: FakeAuthApi) -> AuthSession<FakeAuthApi> {
        let dir = temp_dir(name);
        std::fs::create_dir_all(&dir).unwrap();
        AuthSession::new(
            api,
            SessionCache::new(dir.join("session.json")),
            ProfileCache::new(dir.join("profiles")),
        )
    }

    #[tokio::test]
    async fn test_login_persists_and_restores() {
        let mut auth = session("auth_login", FakeAuthApi::default());
        assert!(auth.login("lilei", "wrong").await.is_err());
        assert!(!auth.is_logged_in());

        auth.login("lilei", "secret").await.unwrap();
        let cached = auth.cache.load().unwrap();
        assert_eq!(cached.username, "lilei");

        let mut restored = AuthSession::new(
            FakeAuthApi::default(),
            auth.cache.clone(),
            auth.profiles.clone(),
        );
        assert_eq!(restored.restore().await.unwrap().username, "lilei");
        assert_eq!(restored.api.current_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_restore_falls_back_to_server() {
        let api = FakeAuthApi {
            server_user: Some(student("hanmeimei")),
            ..Default::default()
        };
        let mut auth = session("auth_restore", api);
        assert_eq!(auth.restore().await.unwrap().username, "hanmeimei");
        assert!(auth.cache.load().is_some());

        let mut anonymous = session("auth_anonymous", FakeAuthApi::default());
        assert!(anonymous.restore().await.is_none());
        assert!(matches!(
            anonymous.require_user(),
            Err(ValidationError::LoginRequired)
        ));
    }

    #[tokio::test]
    async fn test_logout_failure_keeps_session() {
        let api = FakeAuthApi {
            logout_fails: true,
            ..Default::default()
        };
        let mut auth = session("auth_logout_fail", api);
        auth.login("lilei", "secret").await.unwrap();
        assert!(auth.logout().await.is_err());
        assert!(auth.is_logged_in());
        assert!(auth.cache.load().is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_cache() {
        let mut auth = session("auth_logout", FakeAuthApi::default());
        auth.login("lilei", "secret").await.unwrap();
        auth.logout().await.unwrap();
        assert!(!auth.is_logged_in());
        assert!(auth.cache.load().is_none());
    }

    #[tokio::test]
    async fn test_register_sends_student_role_and_caches_profile() {
        let auth = session("auth_register", FakeAuthApi::default());
        let form = RegistrationForm {
            username: "lilei".to_string(),
            password: "secret".to_string(),
            email: "lilei@example.com".to_string(),
            profile: Profile {
                phone: "123".to_string(),
                ..Default::default()
            },
        };
        auth.register(&form).await.unwrap();
        assert_eq!(auth.api.registered.borrow()[0].role, Role::Student);

        let temp = auth.profiles.load_temp("lilei").unwrap();
        assert_eq!(temp.phone, "123");
        assert_eq!(temp.email, "lilei@example.com");
    }
}
