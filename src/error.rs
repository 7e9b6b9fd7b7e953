use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 考试过程错误
    #[error("考试错误: {0}")]
    Exam(#[from] ExamError),
    /// 表单校验错误
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 非 2xx 响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 未登录或会话失效
    #[error("未登录或会话已失效: {endpoint}")]
    Unauthorized { endpoint: String },
    /// API 返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    /// 面向用户展示的提示信息
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadResponse { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Unauthorized { .. } => "请先登录".to_string(),
            ApiError::RequestFailed { .. } => "网络请求失败，请稍后重试".to_string(),
            _ => "服务器返回了无法识别的响应".to_string(),
        }
    }
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 考试过程错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExamError {
    /// 题目索引越界
    #[error("题目索引 {index} 超出范围 [0, {count})")]
    QuestionOutOfRange { index: usize, count: usize },
    /// 选项索引越界
    #[error("第 {question} 题的选项索引 {option} 超出范围 [0, {count})")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        count: usize,
    },
    /// 摄像头未开启，禁止作答与提交
    #[error("摄像头未开启，无法作答或提交")]
    CameraRequired,
    /// 已在提交中或已提交
    #[error("试卷已提交或正在提交")]
    AlreadySubmitted,
    /// 考试已结束
    #[error("考试已结束")]
    SessionClosed,
    /// 试卷没有题目
    #[error("试卷没有题目")]
    EmptyQuiz,
}

/// 表单校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("验证码必须是 6 位数字")]
    InvalidOtp,
    #[error("密码长度至少为 {min} 位")]
    PasswordTooShort { min: usize },
    #[error("两次输入的密码不一致")]
    PasswordMismatch,
    #[error("{0} 不能为空")]
    MissingField(&'static str),
    #[error("第 {question} 题必须有 {expected} 个非空选项")]
    InvalidOptions { question: usize, expected: usize },
    #[error("第 {question} 题的正确选项 {index} 超出范围")]
    InvalidCorrectOption { question: usize, index: usize },
    #[error("试卷至少需要一道题")]
    NoQuestions,
    #[error("只有管理员可以执行此操作")]
    AdminOnly,
    #[error("请先登录")]
    LoginRequired,
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err.url().map(|u| u.path().to_string()).unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 面向用户的简短提示
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(e) => e.user_message(),
            AppError::Validation(e) => e.to_string(),
            AppError::Exam(e) => e.to_string(),
            other => other.to_string(),
        }
    }

    /// 是否为未登录错误
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Api(ApiError::Unauthorized { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
