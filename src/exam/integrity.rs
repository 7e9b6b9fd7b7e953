//! 全屏与标签页监控
//!
//! 两个监控器都只统计“进入违规状态”的那次跳变，计数达到上限时恰好触发一次强制结束。

/// 强制结束考试的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// 多次退出全屏
    FullscreenExits { count: u32 },
    /// 多次切换标签页
    TabSwitches { count: u32 },
}

impl Violation {
    /// 提示给考生的消息
    pub fn alert_message(&self) -> &'static str {
        "检测到可疑行为，考试已被关闭。"
    }

    pub fn describe(&self) -> String {
        match self {
            Violation::FullscreenExits { count } => format!("退出全屏 {} 次", count),
            Violation::TabSwitches { count } => format!("切换标签页 {} 次", count),
        }
    }
}

/// 全屏监控
#[derive(Debug, Clone)]
pub struct FullscreenMonitor {
    is_fullscreen: bool,
    was_fullscreen: bool,
    exit_count: u32,
    limit: u32,
    tripped: bool,
}

impl FullscreenMonitor {
    pub fn new(limit: u32) -> Self {
        Self {
            is_fullscreen: false,
            was_fullscreen: false,
            exit_count: 0,
            limit,
            tripped: false,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn exit_count(&self) -> u32 {
        self.exit_count
    }

    /// 已确认的全屏状态（页面初始状态或主动请求成功）；计数只由事件驱动
    ///
    /// 确认处于全屏时同步跳变基准，下一次退出事件才能被计入
    pub fn note_requested(&mut self, fullscreen: bool) {
        self.is_fullscreen = fullscreen;
        if fullscreen {
            self.was_fullscreen = true;
        }
    }

    /// 处理全屏变化事件
    pub fn on_change(&mut self, fullscreen: bool) -> Option<Violation> {
        self.is_fullscreen = fullscreen;
        if self.was_fullscreen && !fullscreen {
            self.exit_count += 1;
        }
        self.was_fullscreen = fullscreen;

        if !self.tripped && self.exit_count >= self.limit {
            self.tripped = true;
            return Some(Violation::FullscreenExits {
                count: self.exit_count,
            });
        }
        None
    }
}

/// 标签页可见性监控
#[derive(Debug, Clone)]
pub struct VisibilityMonitor {
    hidden: bool,
    was_hidden: bool,
    switch_count: u32,
    limit: u32,
    tripped: bool,
}

impl VisibilityMonitor {
    pub fn new(limit: u32) -> Self {
        Self {
            hidden: false,
            was_hidden: false,
            switch_count: 0,
            limit,
            tripped: false,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn switch_count(&self) -> u32 {
        self.switch_count
    }

    /// 处理可见性变化事件，只有 visible → hidden 计数
    pub fn on_change(&mut self, hidden: bool) -> Option<Violation> {
        self.hidden = hidden;
        if !self.was_hidden && hidden {
            self.switch_count += 1;
        }
        self.was_hidden = hidden;

        if !self.tripped && self.switch_count >= self.limit {
            self.tripped = true;
            return Some(Violation::TabSwitches {
                count: self.switch_count,
            });
        }
        None
    }
}

/// 监考信号快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegritySignal {
    pub fullscreen_exit_count: u32,
    pub tab_switch_count: u32,
    pub is_fullscreen: bool,
    pub tab_hidden: bool,
    pub webcam_active: bool,
}

impl IntegritySignal {
    /// 非阻断的警告横幅
    pub fn warning_banner(&self) -> Option<String> {
        if !self.is_fullscreen {
            let suffix = if self.fullscreen_exit_count > 0 {
                format!("（已检测到退出 {} 次）", self.fullscreen_exit_count)
            } else {
                String::new()
            };
            Some(format!("请在考试期间保持全屏。{}", suffix))
        } else if self.tab_hidden {
            let suffix = if self.tab_switch_count > 0 {
                format!("（切换次数: {}）", self.tab_switch_count)
            } else {
                String::new()
            };
            Some(format!("当前标签页未激活，请返回考试页面。{}", suffix))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit_fullscreen_n_times(monitor: &mut FullscreenMonitor, n: usize) -> Vec<Violation> {
        let mut fired = Vec::new();
        for _ in 0..n {
            fired.extend(monitor.on_change(true));
            fired.extend(monitor.on_change(false));
        }
        fired
    }

    #[test]
    fn test_fullscreen_fires_on_third_exit_only() {
        let mut monitor = FullscreenMonitor::new(3);
        assert!(exit_fullscreen_n_times(&mut monitor, 2).is_empty());
        assert_eq!(monitor.exit_count(), 2);

        let fired = exit_fullscreen_n_times(&mut monitor, 1);
        assert_eq!(fired, vec![Violation::FullscreenExits { count: 3 }]);

        // 超过阈值后不再重复触发
        assert!(exit_fullscreen_n_times(&mut monitor, 3).is_empty());
        assert_eq!(monitor.exit_count(), 6);
    }

    #[test]
    fn test_fullscreen_ignores_repeated_windowed_events() {
        let mut monitor = FullscreenMonitor::new(3);
        // 从未进入全屏时的 windowed 事件不计数
        assert_eq!(monitor.on_change(false), None);
        monitor.on_change(true);
        monitor.on_change(false);
        monitor.on_change(false);
        monitor.on_change(false);
        assert_eq!(monitor.exit_count(), 1);
    }

    #[test]
    fn test_requested_state_does_not_count() {
        let mut monitor = FullscreenMonitor::new(3);
        monitor.note_requested(true);
        assert!(monitor.is_fullscreen());
        monitor.note_requested(false);
        assert_eq!(monitor.exit_count(), 0);
    }

    #[test]
    fn test_exit_after_confirmed_fullscreen_counts() {
        // 页面已处于全屏时不会再收到进入全屏的事件
        let mut monitor = FullscreenMonitor::new(3);
        monitor.note_requested(true);
        assert_eq!(monitor.on_change(false), None);
        assert_eq!(monitor.exit_count(), 1);
        assert!(exit_fullscreen_n_times(&mut monitor, 1).is_empty());
        assert_eq!(
            exit_fullscreen_n_times(&mut monitor, 1),
            vec![Violation::FullscreenExits { count: 3 }]
        );
    }

    #[test]
    fn test_tab_switch_fires_on_second_hide() {
        let mut monitor = VisibilityMonitor::new(2);
        assert_eq!(monitor.on_change(true), None);
        assert_eq!(monitor.on_change(false), None);
        assert_eq!(monitor.switch_count(), 1);
        // hidden → hidden 不计数
        assert_eq!(monitor.on_change(false), None);
        assert_eq!(
            monitor.on_change(true),
            Some(Violation::TabSwitches { count: 2 })
        );
        assert_eq!(monitor.on_change(false), None);
        assert_eq!(monitor.on_change(true), None);
        assert_eq!(monitor.switch_count(), 3);
    }

    #[test]
    fn test_warning_banner() {
        let mut signal = IntegritySignal {
            is_fullscreen: false,
            fullscreen_exit_count: 2,
            ..Default::default()
        };
        assert_eq!(
            signal.warning_banner().as_deref(),
            Some("请在考试期间保持全屏。（已检测到退出 2 次）")
        );

        signal.is_fullscreen = true;
        signal.tab_hidden = true;
        signal.tab_switch_count = 1;
        assert_eq!(
            signal.warning_banner().as_deref(),
            Some("当前标签页未激活，请返回考试页面。（切换次数: 1）")
        );

        signal.tab_hidden = false;
        assert_eq!(signal.warning_banner(), None);
    }
}
