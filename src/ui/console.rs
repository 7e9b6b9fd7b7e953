use std::io::Write;

use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// 行输入
///
/// 后台任务读取标准输入，主循环和考试页面共用同一个输入源
pub struct Console {
    lines: mpsc::UnboundedReceiver<String>,
}

impl Console {
    pub fn new(lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self { lines }
    }

    /// 从标准输入读取
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdin()).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("标准输入已关闭");
        });
        Self::new(rx)
    }

    /// 下一行（去掉首尾空白）；输入结束时返回 None
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await.map(|line| line.trim().to_string())
    }

    /// 显示提示并读取一行
    pub async fn prompt(&mut self, label: &str) -> Option<String> {
        print!("{}", label);
        let _ = std::io::stdout().flush();
        self.next_line().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_are_trimmed_until_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut console = Console::new(rx);
        tx.send("  login \n".to_string()).unwrap();
        drop(tx);
        assert_eq!(console.next_line().await.as_deref(), Some("login"));
        assert_eq!(console.next_line().await, None);
    }
}
