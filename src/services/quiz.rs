//! 试卷浏览与发布 - 业务能力层

use std::path::Path;

use tracing::{info, warn};

use crate::clients::QuizApiClient;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{load_all_quiz_drafts, load_quiz_draft, CreateQuizRequest, PageMeta, Quiz, QuizDraft, QuizPage, User};

/// 试卷接口
#[allow(async_fn_in_trait)]
pub trait QuizCatalog {
    async fn list_quizzes(&self, page: u32, size: u32) -> AppResult<QuizPage>;
    async fn get_quiz(&self, quiz_id: &str) -> AppResult<Quiz>;
    async fn create_quiz(&self, request: &CreateQuizRequest) -> AppResult<String>;
}

impl QuizCatalog for QuizApiClient {
    async fn list_quizzes(&self, page: u32, size: u32) -> AppResult<QuizPage> {
        QuizApiClient::list_quizzes(self, page, size).await
    }

    async fn get_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        QuizApiClient::get_quiz(self, quiz_id).await
    }

    async fn create_quiz(&self, request: &CreateQuizRequest) -> AppResult<String> {
        QuizApiClient::create_quiz(self, request).await
    }
}

/// 试卷列表（带翻页状态）
pub struct Dashboard<A: QuizCatalog = QuizApiClient> {
    api: A,
    page_size: u32,
    quizzes: Vec<Quiz>,
    meta: PageMeta,
}

impl<A: QuizCatalog> Dashboard<A> {
    pub fn new(api: A, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            quizzes: Vec::new(),
            meta: PageMeta::default(),
        }
    }

    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }

    pub fn meta(&self) -> &PageMeta {
        &self.meta
    }

    /// 加载指定页（从 0 开始）
    pub async fn load(&mut self, page: u32) -> AppResult<()> {
        let result = self.api.list_quizzes(page, self.page_size).await?;
        info!("加载试卷列表: {}，共 {} 份", result.meta.label(), result.quizzes.len());
        self.quizzes = result.quizzes;
        self.meta = result.meta;
        Ok(())
    }

    /// 下一页；没有下一页时返回 false
    pub async fn next(&mut self) -> AppResult<bool> {
        match self.meta.next_page() {
            Some(page) => self.load(page).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// 上一页；没有上一页时返回 false
    pub async fn previous(&mut self) -> AppResult<bool> {
        match self.meta.previous_page() {
            Some(page) => self.load(page).await.map(|_| true),
            None => Ok(false),
        }
    }
}

/// 单份草稿的发布结果
#[derive(Debug)]
pub struct PublishReport {
    pub title: String,
    pub source: Option<String>,
    pub result: AppResult<String>,
}

/// 发布试卷草稿（仅管理员）
///
/// 指定文件时只发布该文件，否则发布草稿目录下的全部 TOML
pub async fn publish_drafts<A: QuizCatalog>(
    api: &A,
    user: &User,
    file: Option<&Path>,
    draft_folder: &str,
) -> AppResult<Vec<PublishReport>> {
    if !user.is_admin() {
        return Err(ValidationError::AdminOnly.into());
    }

    let drafts: Vec<QuizDraft> = match file {
        Some(path) => vec![load_quiz_draft(path)
            .await
            .map_err(|e| AppError::Other(format!("{:#}", e)))?],
        None => load_all_quiz_drafts(draft_folder)
            .await
            .map_err(|e| AppError::Other(format!("{:#}", e)))?,
    };

    let mut reports = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let title = draft.title.clone();
        let source = draft.file_path.clone();
        let result = match draft.into_request() {
            Ok(request) => api.create_quiz(&request).await,
            Err(e) => Err(e.into()),
        };
        match &result {
            Ok(_) => info!("✓ 试卷已发布: {}", title),
            Err(e) => warn!("发布试卷 {} 失败: {}", title, e),
        }
        reports.push(PublishReport {
            title,
            source,
            result,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, Role};
    use crate::services::local_store::test_support::temp_dir;
    use std::cell::RefCell;

    struct FakeCatalog {
        total_pages: u32,
        created: RefCell<Vec<CreateQuizRequest>>,
    }

    impl FakeCatalog {
        fn new(total_pages: u32) -> Self {
            Self {
                total_pages,
                created: RefCell::new(Vec::new()),
            }
        }
    }

    impl QuizCatalog for FakeCatalog {
        async fn list_quizzes(&self, page: u32, _size: u32) -> AppResult<QuizPage> {
            Ok(QuizPage {
                quizzes: vec![Quiz {
                    id: format!("quiz-{}", page),
                    title: format!("第 {} 页", page + 1),
                    questions: Vec::<Question>::new(),
                    duration_seconds: None,
                }],
                meta: PageMeta {
                    current_page: page,
                    total_pages: self.total_pages,
                    total_items: self.total_pages as u64,
                    has_next: page + 1 < self.total_pages,
                    has_previous: page > 0,
                },
            })
        }

        async fn get_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
            Err(AppError::Other(format!("not found: {}", quiz_id)))
        }

        async fn create_quiz(&self, request: &CreateQuizRequest) -> AppResult<String> {
            self.created.borrow_mut().push(request.clone());
            Ok("Quiz created".to_string())
        }
    }

    fn user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            username: "admin".to_string(),
            email: None,
            role,
        }
    }

    #[tokio::test]
    async fn test_pagination_is_bounded() {
        let mut dashboard = Dashboard::new(FakeCatalog::new(2), 10);
        dashboard.load(0).await.unwrap();
        assert!(!dashboard.previous().await.unwrap());
        assert!(dashboard.next().await.unwrap());
        assert_eq!(dashboard.meta().current_page, 1);
        assert_eq!(dashboard.quizzes()[0].id, "quiz-1");
        assert!(!dashboard.next().await.unwrap());
        assert!(dashboard.previous().await.unwrap());
        assert_eq!(dashboard.meta().current_page, 0);
    }

    #[test]
    fn test_publish_requires_admin() {
        let api = FakeCatalog::new(1);
        let err = tokio_test::block_on(publish_drafts(&api, &user(Role::Student), None, "missing"))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::AdminOnly)));
    }

    #[tokio::test]
    async fn test_publish_folder_reports_each_draft() {
        let dir = temp_dir("publish");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("a.toml"),
            r#"
title = "有效试卷"

[[question]]
text = "1 + 1 = ?"
options = ["1", "2", "3", "4"]
correct = 1
"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("b.toml"),
            r#"
title = "选项不足"

[[question]]
text = "?"
options = ["A", "B"]
"#,
        )
        .unwrap();

        let api = FakeCatalog::new(1);
        let reports = publish_drafts(&api, &user(Role::Admin), None, dir.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].result.is_ok());
        assert!(matches!(
            reports[1].result,
            Err(AppError::Validation(ValidationError::InvalidOptions { question: 1, .. }))
        ));
        assert_eq!(api.created.borrow().len(), 1);
        assert_eq!(api.created.borrow()[0].questions[0].correct_option, 1);
    }
}
