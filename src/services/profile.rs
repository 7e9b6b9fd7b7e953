//! 个人资料服务 - 业务能力层
//!
//! 服务端优先，本地缓存兜底；缓存中有而服务端没有的资料会尽力回写

use tracing::{debug, info, warn};

use crate::clients::QuizApiClient;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{Profile, User};
use crate::services::local_store::JsonStore;

/// 资料接口
#[allow(async_fn_in_trait)]
pub trait ProfileApi {
    async fn fetch_profile(&self) -> AppResult<Profile>;
    async fn create_profile(&self, profile: &Profile) -> AppResult<()>;
    async fn update_profile(&self, profile: &Profile) -> AppResult<()>;
}

impl ProfileApi for QuizApiClient {
    async fn fetch_profile(&self) -> AppResult<Profile> {
        self.get_profile().await
    }

    async fn create_profile(&self, profile: &Profile) -> AppResult<()> {
        QuizApiClient::create_profile(self, profile).await
    }

    async fn update_profile(&self, profile: &Profile) -> AppResult<()> {
        QuizApiClient::update_profile(self, profile).await
    }
}

/// 资料缓存
#[derive(Debug, Clone)]
pub struct ProfileCache {
    store: JsonStore,
}

impl ProfileCache {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            store: JsonStore::new(dir),
        }
    }

    fn profile_key(user_id: &str) -> String {
        format!("profile:{}", user_id)
    }

    fn temp_key(username: &str) -> String {
        format!("temp_profile_{}", username)
    }

    pub fn load(&self, user_id: &str) -> Option<Profile> {
        self.store.get(&Self::profile_key(user_id))
    }

    pub fn store(&self, user_id: &str, profile: &Profile) -> AppResult<()> {
        self.store.put(&Self::profile_key(user_id), profile)
    }

    /// 注册时填写、尚未关联账号的资料
    pub fn load_temp(&self, username: &str) -> Option<Profile> {
        self.store.get(&Self::temp_key(username))
    }

    pub fn store_temp(&self, username: &str, profile: &Profile) -> AppResult<()> {
        self.store.put(&Self::temp_key(username), profile)
    }

    /// 把注册时的资料迁移到正式键下
    pub fn promote_temp(&self, username: &str, user_id: &str, profile: &Profile) -> AppResult<()> {
        self.store(user_id, profile)?;
        self.store.remove(&Self::temp_key(username));
        Ok(())
    }
}

/// 资料来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Server,
    Cache,
    Registration,
    Default,
}

/// 保存结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Synced,
    /// 服务端保存失败，只写入了本地缓存
    LocalOnly(String),
}

/// 个人资料服务
pub struct ProfileService<A: ProfileApi = QuizApiClient> {
    api: A,
    cache: ProfileCache,
}

impl<A: ProfileApi> ProfileService<A> {
    pub fn new(api: A, cache: ProfileCache) -> Self {
        Self { api, cache }
    }

    /// 加载资料
    pub async fn load(&self, user: &User) -> (Profile, ProfileSource) {
        match self.api.fetch_profile().await {
            Ok(profile) => {
                debug!("从服务端加载资料");
                if let Err(e) = self.cache.store(&user.id, &profile) {
                    warn!("缓存资料失败: {}", e);
                }
                return (profile, ProfileSource::Server);
            }
            Err(e) => debug!("服务端资料不可用: {}", e),
        }

        if let Some(profile) = self.cache.load(&user.id).filter(Profile::has_any_field) {
            info!("使用本地缓存的资料，并尝试同步到服务端");
            if let Err(e) = self.push(&profile).await {
                warn!("同步缓存资料失败: {}", e);
            }
            return (profile, ProfileSource::Cache);
        }

        if let Some(profile) = self.cache.load_temp(&user.username) {
            info!("使用注册时填写的资料");
            if let Err(e) = self.push(&profile).await {
                warn!("同步注册资料失败: {}", e);
            }
            if let Err(e) = self.cache.promote_temp(&user.username, &user.id, &profile) {
                warn!("迁移注册资料失败: {}", e);
            }
            return (profile, ProfileSource::Registration);
        }

        let profile = Profile {
            full_name: user.username.clone(),
            email: user.email.clone().unwrap_or_default(),
            ..Default::default()
        };
        (profile, ProfileSource::Default)
    }

    /// 保存资料：先写服务端，无论成败都写本地缓存
    pub async fn save(&self, user: &User, profile: &Profile) -> AppResult<SaveOutcome> {
        let remote = self.push(profile).await;
        self.cache.store(&user.id, profile)?;
        match remote {
            Ok(()) => {
                info!("✓ 资料已保存");
                Ok(SaveOutcome::Synced)
            }
            Err(e) => {
                warn!("资料仅保存到本地: {}", e);
                Ok(SaveOutcome::LocalOnly(e.user_message()))
            }
        }
    }

    /// 更新服务端资料，服务端尚无记录时改为创建
    async fn push(&self, profile: &Profile) -> AppResult<()> {
        match self.api.update_profile(profile).await {
            Err(AppError::Api(ApiError::BadResponse { status: 404, .. })) => {
                debug!("服务端无资料记录，改为创建");
                self.api.create_profile(profile).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::local_store::test_support::temp_dir;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeProfileApi {
        server: Option<Profile>,
        update_status: Option<u16>,
        updates: RefCell<Vec<Profile>>,
        creates: RefCell<Vec<Profile>>,
    }

    fn bad_response(status: u16) -> AppError {
        AppError::Api(ApiError::BadResponse {
            endpoint: "/api/profile".to_string(),
            status,
            message: String::new(),
        })
    }

    impl ProfileApi for FakeProfileApi {
        async fn fetch_profile(&self) -> AppResult<Profile> {
            self.server.clone().ok_or_else(|| bad_response(404))
        }

        async fn create_profile(&self, profile: &Profile) -> AppResult<()> {
            self.creates.borrow_mut().push(profile.clone());
            Ok(())
        }

        async fn update_profile(&self, profile: &Profile) -> AppResult<()> {
            self.updates.borrow_mut().push(profile.clone());
            match self.update_status {
                Some(status) => Err(bad_response(status)),
                None => Ok(()),
            }
        }
    }

    fn user() -> User {
        User {
            id: "u1".to_string(),
            username: "lilei".to_string(),
            email: Some("lilei@example.com".to_string()),
            role: Role::Student,
        }
    }

    fn profile(name: &str) -> Profile {
        Profile {
            full_name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_server_profile_is_cached() {
        let cache = ProfileCache::new(temp_dir("profile_server"));
        let api = FakeProfileApi {
            server: Some(profile("Server Name")),
            ..Default::default()
        };
        let service = ProfileService::new(api, cache.clone());
        let (loaded, source) = service.load(&user()).await;
        assert_eq!(source, ProfileSource::Server);
        assert_eq!(loaded.full_name, "Server Name");
        assert_eq!(cache.load("u1"), Some(loaded));
    }

    #[tokio::test]
    async fn test_cached_profile_is_pushed_back() {
        let cache = ProfileCache::new(temp_dir("profile_cache"));
        cache.store("u1", &profile("Cached")).unwrap();
        let service = ProfileService::new(FakeProfileApi::default(), cache);
        let (loaded, source) = service.load(&user()).await;
        assert_eq!(source, ProfileSource::Cache);
        assert_eq!(loaded.full_name, "Cached");
        assert_eq!(service.api.updates.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_registration_profile_is_promoted() {
        let cache = ProfileCache::new(temp_dir("profile_temp"));
        cache.store_temp("lilei", &profile("From Signup")).unwrap();
        let service = ProfileService::new(FakeProfileApi::default(), cache.clone());

        let (loaded, source) = service.load(&user()).await;
        assert_eq!(source, ProfileSource::Registration);
        assert_eq!(loaded.full_name, "From Signup");
        assert!(cache.load_temp("lilei").is_none());
        assert_eq!(cache.load("u1"), Some(loaded));
    }

    #[tokio::test]
    async fn test_default_profile_from_user() {
        let cache = ProfileCache::new(temp_dir("profile_default"));
        let service = ProfileService::new(FakeProfileApi::default(), cache);
        let (loaded, source) = service.load(&user()).await;
        assert_eq!(source, ProfileSource::Default);
        assert_eq!(loaded.full_name, "lilei");
        assert_eq!(loaded.email, "lilei@example.com");
        assert!(service.api.updates.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_save_falls_back_to_local() {
        let cache = ProfileCache::new(temp_dir("profile_save"));
        let api = FakeProfileApi {
            update_status: Some(500),
            ..Default::default()
        };
        let service = ProfileService::new(api, cache.clone());
        let outcome = service.save(&user(), &profile("Local")).await.unwrap();
        assert!(matches!(outcome, SaveOutcome::LocalOnly(_)));
        assert_eq!(cache.load("u1").unwrap().full_name, "Local");
    }

    #[tokio::test]
    async fn test_save_creates_when_missing() {
        let cache = ProfileCache::new(temp_dir("profile_create"));
        let api = FakeProfileApi {
            update_status: Some(404),
            ..Default::default()
        };
        let service = ProfileService::new(api, cache);
        let outcome = service.save(&user(), &profile("New")).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Synced);
        assert_eq!(service.api.creates.borrow().len(), 1);
    }
}
