/// 倒计时剩余时间低于该值时显示警告
pub const WARNING_THRESHOLD_SECS: u32 = 30;

/// 单次计时结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// 仍在计时，携带剩余秒数
    Running(u32),
    /// 本次计时到零，只会出现一次
    Expired,
    /// 已停止或已到期，不再计时
    Idle,
}

/// 考试倒计时
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    expired: bool,
    stopped: bool,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            expired: false,
            stopped: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        !self.expired && !self.stopped
    }

    /// 剩余时间不多时界面需要警告
    pub fn is_warning(&self) -> bool {
        self.remaining <= WARNING_THRESHOLD_SECS
    }

    /// 经过一秒
    pub fn tick(&mut self) -> Tick {
        if !self.is_running() {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    /// 成绩已产生后停止计时
    pub fn stop(&mut self) {
        self.stopped = true;
    }
}
