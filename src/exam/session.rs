//! 考试会话
//!
//! `ExamState` 是纯状态机，`ExamSession` 在单个任务里用 `tokio::select!`
//! 驱动它：每秒计时、平台事件、考生指令、摄像头请求与成绩上报。

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, ExamError};
use crate::exam::answers::AnswerSet;
use crate::exam::camera::{CameraGate, CameraLease, CameraStatus};
use crate::exam::integrity::{FullscreenMonitor, IntegritySignal, Violation, VisibilityMonitor};
use crate::exam::platform::{ExamPlatform, PlatformEvent};
use crate::exam::submission::{
    report_with_retry, ResultReporter, Submission, SubmissionPhase, SubmitTrigger,
};
use crate::exam::timer::{Countdown, Tick};
use crate::models::{Quiz, ResultSubmission};

/// 考试参数
#[derive(Debug, Clone)]
pub struct ExamSettings {
    pub fullscreen_exit_limit: u32,
    pub tab_switch_limit: u32,
    pub submit_max_retries: usize,
    pub submit_retry_delay: Duration,
    /// 挂载后自动进入全屏的延迟
    pub auto_fullscreen_delay: Duration,
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ExamSettings {
    fn from(config: &Config) -> Self {
        Self {
            fullscreen_exit_limit: config.fullscreen_exit_limit,
            tab_switch_limit: config.tab_switch_limit,
            submit_max_retries: config.submit_max_retries,
            submit_retry_delay: Duration::from_millis(config.submit_retry_delay_ms),
            auto_fullscreen_delay: Duration::from_millis(100),
        }
    }
}

/// 考生指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamCommand {
    /// 作答（下标从 0 开始）
    Answer { question: usize, option: usize },
    Submit,
    EnterFullscreen,
    ExitFullscreen,
    /// 离开考试页面
    Leave,
}

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    InProgress,
    Submitting,
    Submitted { score: u8 },
    Terminated(Violation),
    Left,
}

impl ExamPhase {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ExamPhase::Submitted { .. } | ExamPhase::Terminated(_) | ExamPhase::Left
        )
    }
}

/// 会话结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamOutcome {
    /// 成绩已上报，进入成绩页
    Submitted { quiz_id: String, score: u8 },
    /// 违规被强制结束
    Terminated {
        violation: Violation,
        signal: IntegritySignal,
    },
    /// 考生中途离开
    Left,
}

/// 提供给界面渲染的状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSnapshot {
    pub time_left: u32,
    pub timer_warning: bool,
    pub signal: IntegritySignal,
    pub camera: CameraStatus,
    pub answers: AnswerSet,
    pub phase: ExamPhase,
    /// 最近一次操作失败的提示
    pub error: Option<String>,
    /// 已计算但尚未上报成功的成绩
    pub pending_score: Option<u8>,
}

impl ExamSnapshot {
    /// 作答与交卷控件是否可用
    pub fn controls_enabled(&self) -> bool {
        self.signal.webcam_active && self.phase == ExamPhase::InProgress
    }
}

/// 状态机需要执行的副作用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamAction {
    Submit(ResultSubmission),
    Terminate(Violation),
}

/// 考试会话状态机
#[derive(Debug, Clone)]
pub struct ExamState {
    quiz: Quiz,
    countdown: Countdown,
    fullscreen: FullscreenMonitor,
    visibility: VisibilityMonitor,
    camera: CameraGate,
    answers: AnswerSet,
    submission: Submission,
    phase: ExamPhase,
    error: Option<String>,
}

impl ExamState {
    pub fn new(quiz: Quiz, settings: &ExamSettings) -> Result<Self, ExamError> {
        if quiz.questions.is_empty() {
            return Err(ExamError::EmptyQuiz);
        }
        Ok(Self {
            countdown: Countdown::new(quiz.effective_duration()),
            fullscreen: FullscreenMonitor::new(settings.fullscreen_exit_limit),
            visibility: VisibilityMonitor::new(settings.tab_switch_limit),
            camera: CameraGate::new(),
            answers: AnswerSet::new(),
            submission: Submission::new(quiz.id.clone()),
            phase: ExamPhase::InProgress,
            error: None,
            quiz,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    pub fn time_left(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_fullscreen()
    }

    /// 计时器是否还需要继续调度
    pub fn timer_active(&self) -> bool {
        !self.phase.is_finished() && self.countdown.is_running()
    }

    pub fn signal(&self) -> IntegritySignal {
        IntegritySignal {
            fullscreen_exit_count: self.fullscreen.exit_count(),
            tab_switch_count: self.visibility.switch_count(),
            is_fullscreen: self.fullscreen.is_fullscreen(),
            tab_hidden: self.visibility.is_hidden(),
            webcam_active: self.camera.is_active(),
        }
    }

    pub fn snapshot(&self) -> ExamSnapshot {
        ExamSnapshot {
            time_left: self.countdown.remaining(),
            timer_warning: self.countdown.is_warning(),
            signal: self.signal(),
            camera: self.camera.status().clone(),
            answers: self.answers.clone(),
            phase: self.phase,
            error: self.error.clone(),
            pending_score: match self.submission.phase() {
                SubmissionPhase::Failed { score, .. } => Some(*score),
                _ => None,
            },
        }
    }

    pub fn outcome(&self) -> Option<ExamOutcome> {
        match self.phase {
            ExamPhase::Submitted { score } => Some(ExamOutcome::Submitted {
                quiz_id: self.quiz.id.clone(),
                score,
            }),
            ExamPhase::Terminated(violation) => Some(ExamOutcome::Terminated {
                violation,
                signal: self.signal(),
            }),
            ExamPhase::Left => Some(ExamOutcome::Left),
            ExamPhase::InProgress | ExamPhase::Submitting => None,
        }
    }

    /// 经过一秒；到零时自动交卷
    pub fn on_tick(&mut self) -> Option<ExamAction> {
        if self.phase.is_finished() {
            return None;
        }
        match self.countdown.tick() {
            Tick::Expired if self.submission.is_in_flight() => None,
            Tick::Expired => {
                info!("[考试 {}] ⏰ 时间到，自动交卷", self.quiz.id);
                self.request_submit(SubmitTrigger::Timeout)
                    .ok()
                    .map(ExamAction::Submit)
            }
            Tick::Running(_) | Tick::Idle => None,
        }
    }

    /// 处理平台事件；达到阈值时返回强制结束
    pub fn on_platform_event(&mut self, event: PlatformEvent) -> Option<ExamAction> {
        if self.phase.is_finished() {
            return None;
        }
        let violation = match event {
            PlatformEvent::FullscreenChanged { fullscreen } => {
                debug!("[考试 {}] 全屏状态: {}", self.quiz.id, fullscreen);
                self.fullscreen.on_change(fullscreen)
            }
            PlatformEvent::VisibilityChanged { hidden } => {
                debug!("[考试 {}] 标签页隐藏: {}", self.quiz.id, hidden);
                self.visibility.on_change(hidden)
            }
        };
        violation.map(|v| {
            warn!("[考试 {}] 🚨 {}，强制结束考试", self.quiz.id, v.describe());
            self.terminate(v);
            ExamAction::Terminate(v)
        })
    }

    pub fn on_camera_result(&mut self, result: Result<(), String>) {
        match &result {
            Ok(()) => info!("[考试 {}] 📷 摄像头已开启", self.quiz.id),
            Err(reason) => warn!("[考试 {}] 摄像头不可用: {}", self.quiz.id, reason),
        }
        self.camera.on_request_result(result);
    }

    /// 已确认的全屏状态（页面初始状态或主动请求成功）
    pub fn note_fullscreen_requested(&mut self, fullscreen: bool) {
        self.fullscreen.note_requested(fullscreen);
    }

    /// 作答
    pub fn answer(&mut self, question: usize, option: usize) -> Result<(), ExamError> {
        let result = self.guard_interaction().and_then(|_| {
            self.answers.record(&self.quiz, question, option)
        });
        self.remember(&result);
        result
    }

    /// 交卷：计算成绩并进入上报阶段
    ///
    /// 手动交卷受摄像头门禁限制，超时交卷不受限制
    pub fn request_submit(&mut self, trigger: SubmitTrigger) -> Result<ResultSubmission, ExamError> {
        let result = self.try_begin_submit(trigger);
        self.remember(&result);
        result
    }

    fn try_begin_submit(&mut self, trigger: SubmitTrigger) -> Result<ResultSubmission, ExamError> {
        if self.phase.is_finished() {
            return Err(ExamError::SessionClosed);
        }
        if trigger == SubmitTrigger::Manual {
            self.camera.ensure_active()?;
        }
        let score = self.answers.score(&self.quiz);
        let payload = self.submission.begin(score)?;
        info!(
            "[考试 {}] 📤 交卷 ({:?})，答对 {}/{}，得分 {}",
            self.quiz.id,
            trigger,
            self.answers.correct_count(&self.quiz),
            self.quiz.question_count(),
            score
        );
        self.phase = ExamPhase::Submitting;
        Ok(payload)
    }

    /// 处理上报结果
    pub fn on_submit_result(&mut self, result: AppResult<()>) {
        if self.phase != ExamPhase::Submitting {
            return;
        }
        self.submission.finish(&result);
        match self.submission.phase().clone() {
            SubmissionPhase::Done { score } => {
                self.countdown.stop();
                self.camera.mark_released();
                self.error = None;
                self.phase = ExamPhase::Submitted { score };
            }
            SubmissionPhase::Failed { score, message } => {
                error!("[考试 {}] ❌ 成绩 {} 上报失败: {}", self.quiz.id, score, message);
                self.error = Some(format!("成绩提交失败：{}，请重新提交", message));
                self.phase = ExamPhase::InProgress;
            }
            SubmissionPhase::Idle | SubmissionPhase::InFlight { .. } => {}
        }
    }

    /// 离开考试页面
    pub fn leave(&mut self) {
        if !self.phase.is_finished() {
            info!("[考试 {}] 考生离开考试页面", self.quiz.id);
            self.submission.abandon();
            self.camera.mark_released();
            self.phase = ExamPhase::Left;
        }
    }

    fn terminate(&mut self, violation: Violation) {
        self.submission.abandon();
        self.camera.mark_released();
        self.phase = ExamPhase::Terminated(violation);
    }

    fn guard_interaction(&self) -> Result<(), ExamError> {
        match self.phase {
            ExamPhase::InProgress => self.camera.ensure_active(),
            ExamPhase::Submitting => Err(ExamError::AlreadySubmitted),
            _ => Err(ExamError::SessionClosed),
        }
    }

    fn remember<T>(&mut self, result: &Result<T, ExamError>) {
        self.error = result.as_ref().err().map(|e| e.to_string());
    }
}

type SubmitFuture<'a> = Pin<Box<dyn Future<Output = AppResult<()>> + 'a>>;

/// 考试会话：在一个任务中驱动状态机
pub struct ExamSession<'a, P: ExamPlatform, R: ResultReporter> {
    state: ExamState,
    platform: &'a P,
    reporter: &'a R,
    settings: ExamSettings,
    snapshots: watch::Sender<ExamSnapshot>,
}

impl<'a, P: ExamPlatform + 'a, R: ResultReporter + 'a> ExamSession<'a, P, R> {
    /// 创建会话，同时返回状态快照的订阅端
    pub fn new(
        quiz: Quiz,
        platform: &'a P,
        reporter: &'a R,
        settings: ExamSettings,
    ) -> Result<(Self, watch::Receiver<ExamSnapshot>), ExamError> {
        let mut state = ExamState::new(quiz, &settings)?;
        if platform.starts_fullscreen() {
            state.note_fullscreen_requested(true);
        }
        let (snapshots, receiver) = watch::channel(state.snapshot());
        Ok((
            Self {
                state,
                platform,
                reporter,
                settings,
                snapshots,
            },
            receiver,
        ))
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }

    /// 运行会话直到交卷、被强制结束或离开
    ///
    /// 任何退出路径都会释放摄像头并停止计时；指令通道关闭视为离开
    pub async fn run(mut self, mut commands: mpsc::Receiver<ExamCommand>) -> ExamOutcome {
        let platform = self.platform;
        let reporter = self.reporter;
        let quiz_id = self.state.quiz().id.clone();

        let mut lease = CameraLease::new(platform);
        let mut events = platform.subscribe();
        let mut events_open = true;

        let camera_request = platform.request_camera();
        tokio::pin!(camera_request);
        let mut camera_pending = true;

        let auto_fullscreen = sleep(self.settings.auto_fullscreen_delay);
        tokio::pin!(auto_fullscreen);
        let mut auto_fullscreen_pending = true;

        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);

        let mut submit_future: Option<SubmitFuture<'a>> = None;

        let outcome = loop {
            self.publish();
            if let Some(outcome) = self.state.outcome() {
                break outcome;
            }

            let mut action = None;
            tokio::select! {
                _ = ticker.tick(), if self.state.timer_active() => {
                    action = self.state.on_tick();
                }
                _ = &mut auto_fullscreen, if auto_fullscreen_pending => {
                    auto_fullscreen_pending = false;
                    if !self.state.is_fullscreen() {
                        match platform.enter_fullscreen().await {
                            Ok(()) => self.state.note_fullscreen_requested(true),
                            Err(e) => debug!("[考试 {}] 自动进入全屏失败: {}", quiz_id, e),
                        }
                    }
                }
                result = &mut camera_request, if camera_pending => {
                    camera_pending = false;
                    self.state.on_camera_result(result);
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => action = self.state.on_platform_event(event),
                    None => events_open = false,
                },
                command = commands.recv() => match command {
                    Some(command) => action = self.handle_command(command).await,
                    None => self.state.leave(),
                },
                result = poll_submission(&mut submit_future), if submit_future.is_some() => {
                    submit_future = None;
                    self.state.on_submit_result(result);
                }
            }

            match action {
                Some(ExamAction::Submit(payload)) => {
                    submit_future = Some(Box::pin(report_with_retry(
                        reporter,
                        payload,
                        self.settings.submit_max_retries,
                        self.settings.submit_retry_delay,
                    )));
                }
                Some(ExamAction::Terminate(_)) => {
                    submit_future = None;
                }
                None => {}
            }
        };

        lease.release();
        self.publish();

        match &outcome {
            ExamOutcome::Submitted { score, .. } => info!("[考试 {}] ✅ 交卷完成，得分 {}", quiz_id, score),
            ExamOutcome::Terminated { violation, .. } => {
                warn!("[考试 {}] ⛔ 考试被强制结束: {}", quiz_id, violation.describe())
            }
            ExamOutcome::Left => info!("[考试 {}] 已离开考试", quiz_id),
        }
        outcome
    }

    async fn handle_command(&mut self, command: ExamCommand) -> Option<ExamAction> {
        match command {
            ExamCommand::Answer { question, option } => {
                if let Err(e) = self.state.answer(question, option) {
                    debug!("作答被拒绝: {}", e);
                }
                None
            }
            ExamCommand::Submit => self
                .state
                .request_submit(SubmitTrigger::Manual)
                .ok()
                .map(ExamAction::Submit),
            ExamCommand::EnterFullscreen => {
                match self.platform.enter_fullscreen().await {
                    Ok(()) => self.state.note_fullscreen_requested(true),
                    Err(e) => debug!("进入全屏失败: {}", e),
                }
                None
            }
            ExamCommand::ExitFullscreen => {
                match self.platform.exit_fullscreen().await {
                    Ok(()) => self.state.note_fullscreen_requested(false),
                    Err(e) => debug!("退出全屏失败: {}", e),
                }
                None
            }
            ExamCommand::Leave => {
                self.state.leave();
                None
            }
        }
    }
}

/// 轮询进行中的上报；调用方保证存在上报任务
async fn poll_submission(submit_future: &mut Option<SubmitFuture<'_>>) -> AppResult<()> {
    match submit_future.as_mut() {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}
