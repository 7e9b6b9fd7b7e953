//! 应用主循环 - 编排层
//!
//! 持有 API 客户端、登录会话和各页面服务，按命令调度到对应页面

use tracing::{error, info, warn};

use crate::clients::QuizApiClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{Profile, ResultFilter};
use crate::orchestrator::router::{Command, FilterArg};
use crate::services::password_reset::ResetStep;
use crate::services::{
    publish_drafts, AuthSession, Dashboard, PasswordReset, ProfileCache, ProfileService,
    RegistrationForm, ResultsService, SaveOutcome, SessionCache,
};
use crate::ui::{render, Console};
use crate::utils::logging::{init_log_file, log_startup};
use crate::workflow::ExamFlow;

/// 应用主结构
pub struct App {
    config: Config,
    api: QuizApiClient,
    auth: AuthSession,
    dashboard: Dashboard,
    results: ResultsService,
    profiles: ProfileService,
    exam_flow: ExamFlow,
    /// 正在编辑、尚未保存的资料
    profile_draft: Option<Profile>,
    console: Console,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        if let Err(e) = init_log_file(&config.incident_log_file) {
            warn!("初始化监考日志失败: {:#}", e);
        }
        log_startup(
            &config.api_base_url,
            config.fullscreen_exit_limit,
            config.tab_switch_limit,
        );

        let api = QuizApiClient::new(&config)?;
        let profile_cache = ProfileCache::new(config.profile_cache_dir.clone());
        let mut auth = AuthSession::new(
            api.clone(),
            SessionCache::new(config.session_cache_path.clone()),
            profile_cache.clone(),
        );
        if let Some(user) = auth.restore().await {
            info!("欢迎回来，{}", user.username);
        }

        Ok(Self {
            dashboard: Dashboard::new(api.clone(), config.page_size),
            results: ResultsService::new(
                api.clone(),
                config.page_size,
                config.title_fetch_concurrency,
            ),
            profiles: ProfileService::new(api.clone(), profile_cache),
            exam_flow: ExamFlow::new(&config),
            profile_draft: None,
            console: Console::stdin(),
            auth,
            api,
            config,
        })
    }

    /// 运行主循环，直到 quit 或输入结束
    pub async fn run(mut self) -> AppResult<()> {
        render::print_help();
        loop {
            let label = match self.auth.user() {
                Some(user) => format!("{}> ", user.username),
                None => "quiz> ".to_string(),
            };
            let Some(line) = self.console.prompt(&label).await else {
                break;
            };
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(hint) => {
                    if !hint.is_empty() {
                        println!("{}", hint);
                    }
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }

            if command.requires_login() && !self.auth.is_logged_in() {
                println!("请先登录");
                if !self.login().await {
                    continue;
                }
            }

            if let Err(e) = self.dispatch(command).await {
                error!("命令执行失败: {}", e);
                println!("❌ {}", e.user_message());
                if e.is_unauthorized() {
                    println!("登录已失效，请重新登录");
                }
            }
        }
        info!("👋 再见");
        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> AppResult<()> {
        match command {
            Command::Login => {
                self.login().await;
            }
            Command::Register => self.register().await?,
            Command::Logout => {
                self.auth.logout().await?;
                self.profile_draft = None;
                println!("已退出登录");
            }
            Command::WhoAmI => render::print_user(self.auth.require_user()?),
            Command::Quizzes(page) => {
                self.dashboard.load(page).await?;
                self.show_dashboard();
            }
            Command::Next => {
                if self.dashboard.next().await? {
                    self.show_dashboard();
                } else {
                    println!("已经是最后一页");
                }
            }
            Command::Prev => {
                if self.dashboard.previous().await? {
                    self.show_dashboard();
                } else {
                    println!("已经是第一页");
                }
            }
            Command::Take(quiz_id) => self.take(&quiz_id).await?,
            Command::Results(page) => {
                let user = self.auth.require_user()?.clone();
                self.results.load(&user, page).await?;
                self.show_results();
            }
            Command::Filter(arg) => self.filter(arg)?,
            Command::Create(file) => {
                let user = self.auth.require_user()?;
                let reports = publish_drafts(
                    &self.api,
                    user,
                    file.as_deref(),
                    &self.config.quiz_draft_folder,
                )
                .await?;
                render::print_publish_reports(&reports);
            }
            Command::Profile => {
                let user = self.auth.require_user()?;
                let (profile, source) = self.profiles.load(user).await;
                render::print_profile(&profile, Some(source));
                self.profile_draft = Some(profile);
            }
            Command::ProfileSet(field, value) => {
                let user = self.auth.require_user()?;
                if self.profile_draft.is_none() {
                    self.profile_draft = Some(self.profiles.load(user).await.0);
                }
                if let Some(draft) = self.profile_draft.as_mut() {
                    draft.set(field, value);
                    render::print_profile(draft, None);
                }
            }
            Command::ProfileSave => {
                let user = self.auth.require_user()?;
                let Some(draft) = self.profile_draft.as_ref() else {
                    println!("没有需要保存的修改");
                    return Ok(());
                };
                match self.profiles.save(user, draft).await? {
                    SaveOutcome::Synced => println!("✓ 资料已保存"),
                    SaveOutcome::LocalOnly(reason) => {
                        println!("⚠️ 服务器保存失败（{}），资料已保存在本地", reason)
                    }
                }
            }
            Command::Forgot => self.forgot_password().await,
            Command::Help => render::print_help(),
            Command::Quit => {}
        }
        Ok(())
    }

    fn show_dashboard(&self) {
        render::print_quiz_list(
            self.dashboard.quizzes(),
            self.dashboard.meta(),
            self.auth.is_admin(),
        );
    }

    fn show_results(&self) {
        let is_admin = self.auth.is_admin();
        let rows = if is_admin {
            self.results.visible()
        } else {
            self.results.page().results.iter().collect()
        };
        render::print_results(
            &rows,
            |row| Some(self.results.title(&row.quiz_id).to_string()),
            &self.results.page().meta,
            is_admin,
            self.results.filter(),
        );
    }

    fn filter(&mut self, arg: FilterArg) -> AppResult<()> {
        if !self.auth.is_admin() {
            return Err(ValidationError::AdminOnly.into());
        }
        let mut filter = self.results.filter().clone();
        match arg {
            FilterArg::Quiz(id) => filter.quiz_id = Some(id),
            FilterArg::User(text) => filter.user_query = Some(text),
            FilterArg::Clear => filter = ResultFilter::default(),
        }
        self.results.set_filter(filter);
        self.show_results();
        Ok(())
    }

    async fn take(&mut self, quiz_id: &str) -> AppResult<()> {
        let user = self.auth.require_user()?.clone();
        let report = self
            .exam_flow
            .run(&self.api, &user, quiz_id, &mut self.console)
            .await?;
        if matches!(report.outcome, crate::exam::ExamOutcome::Submitted { .. }) {
            // 交卷后展示成绩页
            self.results.load(&user, 0).await?;
            self.show_results();
        }
        Ok(())
    }

    /// 登录，成功返回 true
    async fn login(&mut self) -> bool {
        let Some(username) = self.console.prompt("用户名: ").await else {
            return false;
        };
        let Some(password) = self.console.prompt("密码: ").await else {
            return false;
        };
        match self.auth.login(&username, &password).await {
            Ok(user) => {
                println!("✓ 欢迎，{} ({})", user.username, user.role.name());
                self.profile_draft = None;
                true
            }
            Err(e) => {
                println!("❌ 登录失败: {}", e.user_message());
                false
            }
        }
    }

    async fn register(&mut self) -> AppResult<()> {
        let mut form = RegistrationForm::default();
        let mut answers = Vec::new();
        for label in [
            "用户名: ",
            "密码: ",
            "确认密码: ",
            "邮箱: ",
            "姓名 (可选): ",
            "电话 (可选): ",
            "学校 (可选): ",
        ] {
            match self.console.prompt(label).await {
                Some(value) => answers.push(value),
                None => return Ok(()),
            }
        }
        let [username, password, confirm, email, full_name, phone, institution]: [String; 7] =
            answers
                .try_into()
                .map_err(|_| AppError::Other("注册信息不完整".to_string()))?;
        if password != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        form.username = username;
        form.password = password;
        form.email = email;
        form.profile = Profile {
            full_name,
            email: String::new(),
            phone,
            institution,
        };
        let message = self.auth.register(&form).await?;
        println!("✓ {}，请使用新账号登录", message);
        Ok(())
    }

    async fn forgot_password(&mut self) {
        let mut flow = PasswordReset::new(self.api.clone());
        loop {
            let prompt = match flow.step() {
                ResetStep::Email => "邮箱 (留空取消): ",
                ResetStep::Otp => "6 位验证码 (b 返回): ",
                ResetStep::NewPassword => "新密码 (b 返回): ",
                ResetStep::Done => {
                    println!("✓ 密码已重置，请重新登录");
                    return;
                }
            };
            let Some(input) = self.console.prompt(prompt).await else {
                return;
            };
            if input.is_empty() && flow.step() == ResetStep::Email {
                return;
            }
            if input == "b" {
                flow.back();
                continue;
            }
            let result = match flow.step() {
                ResetStep::Email => flow.submit_email(&input).await,
                ResetStep::Otp => flow.submit_otp(&input).await,
                ResetStep::NewPassword => {
                    let Some(confirm) = self.console.prompt("确认新密码: ").await else {
                        return;
                    };
                    flow.submit_password(&input, &confirm).await
                }
                ResetStep::Done => return,
            };
            match result {
                Ok(message) if !message.is_empty() => println!("✓ {}", message),
                Ok(_) => {}
                Err(e) => println!("❌ {}", e.user_message()),
            }
        }
    }
}
