//! 成绩查询 - 业务能力层
//!
//! 管理员查看全部成绩，并发拉取试卷标题；其他用户只看自己的成绩

use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::clients::QuizApiClient;
use crate::error::AppResult;
use crate::models::{Quiz, QuizResult, ResultFilter, ResultPage, User};

/// 成绩接口
#[allow(async_fn_in_trait)]
pub trait ResultsApi {
    async fn my_results(&self, page: u32, size: u32) -> AppResult<ResultPage>;
    async fn all_results(&self, page: u32, size: u32) -> AppResult<ResultPage>;
    async fn get_quiz(&self, quiz_id: &str) -> AppResult<Quiz>;
}

impl ResultsApi for QuizApiClient {
    async fn my_results(&self, page: u32, size: u32) -> AppResult<ResultPage> {
        QuizApiClient::my_results(self, page, size).await
    }

    async fn all_results(&self, page: u32, size: u32) -> AppResult<ResultPage> {
        QuizApiClient::all_results(self, page, size).await
    }

    async fn get_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        QuizApiClient::get_quiz(self, quiz_id).await
    }
}

/// 成绩服务
pub struct ResultsService<A: ResultsApi = QuizApiClient> {
    api: A,
    page_size: u32,
    concurrency: usize,
    titles: HashMap<String, String>,
    page: ResultPage,
    filter: ResultFilter,
}

impl<A: ResultsApi> ResultsService<A> {
    pub fn new(api: A, page_size: u32, concurrency: usize) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            concurrency: concurrency.max(1),
            titles: HashMap::new(),
            page: ResultPage::default(),
            filter: ResultFilter::default(),
        }
    }

    pub fn page(&self) -> &ResultPage {
        &self.page
    }

    pub fn filter(&self) -> &ResultFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ResultFilter) {
        self.filter = filter;
    }

    /// 当前页中符合筛选条件的成绩
    pub fn visible(&self) -> Vec<&QuizResult> {
        self.filter.apply(&self.page.results)
    }

    /// 试卷标题，未解析时显示 ID
    pub fn title<'s>(&'s self, quiz_id: &'s str) -> &'s str {
        self.titles.get(quiz_id).map(String::as_str).unwrap_or(quiz_id)
    }

    /// 按角色加载成绩
    pub async fn load(&mut self, user: &User, page: u32) -> AppResult<()> {
        let result = if user.is_admin() {
            self.api.all_results(page, self.page_size).await?
        } else {
            self.api.my_results(page, self.page_size).await?
        };
        info!("加载成绩: {}，共 {} 条", result.meta.label(), result.results.len());
        self.page = result;

        if user.is_admin() {
            let ids: Vec<String> = self.page.results.iter().map(|r| r.quiz_id.clone()).collect();
            self.resolve_titles(ids).await;
        }
        Ok(())
    }

    /// 并发拉取尚未缓存的试卷标题，失败时以 ID 代替
    pub async fn resolve_titles(&mut self, quiz_ids: Vec<String>) {
        let mut seen = HashSet::new();
        let unknown: Vec<String> = quiz_ids
            .into_iter()
            .filter(|id| !self.titles.contains_key(id) && seen.insert(id.clone()))
            .collect();
        if unknown.is_empty() {
            return;
        }
        debug!("拉取 {} 份试卷标题 (并发 {})", unknown.len(), self.concurrency);

        let api = &self.api;
        let resolved: Vec<(String, String)> = stream::iter(unknown)
            .map(|id| async move {
                let title = match api.get_quiz(&id).await {
                    Ok(quiz) => quiz.title,
                    Err(e) => {
                        debug!("获取试卷 {} 标题失败: {}", id, e);
                        id.clone()
                    }
                };
                (id, title)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        self.titles.extend(resolved);
    }
}
