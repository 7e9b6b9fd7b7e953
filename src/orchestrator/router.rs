//! 命令路由
//!
//! 把一行输入解析为主界面命令；页码在界面上从 1 开始

use std::path::PathBuf;
use std::str::FromStr;

use crate::models::ProfileField;

/// 成绩筛选参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterArg {
    Quiz(String),
    User(String),
    Clear,
}

/// 主界面命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Register,
    Logout,
    WhoAmI,
    /// 试卷列表（页码从 0 开始）
    Quizzes(u32),
    Next,
    Prev,
    Take(String),
    /// 成绩列表（页码从 0 开始）
    Results(u32),
    Filter(FilterArg),
    Create(Option<PathBuf>),
    Profile,
    ProfileSet(ProfileField, String),
    ProfileSave,
    Forgot,
    Help,
    Quit,
}

impl Command {
    /// 需要先登录的命令
    pub fn requires_login(&self) -> bool {
        !matches!(
            self,
            Command::Login | Command::Register | Command::Forgot | Command::Help | Command::Quit
        )
    }
}

/// 页码参数：省略时为第一页
fn parse_page(arg: Option<&str>) -> Result<u32, String> {
    match arg {
        None => Ok(0),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .map(|p| p - 1)
            .ok_or_else(|| format!("无效的页码: {}", raw)),
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(String::new());
        };
        let command = match head.to_ascii_lowercase().as_str() {
            "login" => Command::Login,
            "register" => Command::Register,
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "quizzes" | "dashboard" => Command::Quizzes(parse_page(parts.next())?),
            "next" => Command::Next,
            "prev" => Command::Prev,
            "take" => {
                let id = parts.next().ok_or("用法: take <试卷ID>")?;
                Command::Take(id.to_string())
            }
            "results" => Command::Results(parse_page(parts.next())?),
            "filter" => match (parts.next(), parts.next()) {
                (Some("quiz"), Some(id)) => Command::Filter(FilterArg::Quiz(id.to_string())),
                (Some("user"), Some(text)) => {
                    let rest: Vec<&str> = std::iter::once(text).chain(parts.by_ref()).collect();
                    Command::Filter(FilterArg::User(rest.join(" ")))
                }
                (Some("clear"), None) => Command::Filter(FilterArg::Clear),
                _ => return Err("用法: filter quiz <ID> | filter user <关键字> | filter clear".into()),
            },
            "create" => Command::Create(parts.next().map(PathBuf::from)),
            "profile" => match parts.next() {
                None => Command::Profile,
                Some("save") => Command::ProfileSave,
                Some("set") => {
                    let field = parts
                        .next()
                        .ok_or("用法: profile set <字段> <值>")?
                        .parse::<ProfileField>()?;
                    let value: Vec<&str> = parts.by_ref().collect();
                    Command::ProfileSet(field, value.join(" "))
                }
                Some(other) => return Err(format!("未知的 profile 子命令: {}", other)),
            },
            "forgot" => Command::Forgot,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("未知命令: {}，输入 help 查看帮助", other)),
        };
        Ok(command)
    }
}
