use std::path::PathBuf;

use thiserror::Error;

/// 统一的结果类型
pub type HeatResult<T> = Result<T, HeatError>;

/// 错误大类：格式错误、资源错误、配置错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 文件内容不符合体数据格式
    Format,
    /// 打开、创建或下载失败
    Resource,
    /// 运行参数不合法，在模拟开始前拒绝
    Configuration,
}

/// 读写、模拟过程中可能出现的全部错误
#[derive(Debug, Error)]
pub enum HeatError {
    #[error("不支持的文件版本 {version}，仅支持版本 1")]
    UnsupportedVersion { version: i32 },

    #[error("不支持的体素数据类型 {code}，仅支持 0 (uchar) 与 3 (float)")]
    UnsupportedDatatype { code: i32 },

    #[error("非法的体数据维度 {width}x{height}x{depth}")]
    InvalidDimensions { width: i32, height: i32, depth: i32 },

    #[error("数据不完整: {what} 需要 {expected} 字节，实际只有 {actual} 字节")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("第 {index} 个体素的浮点标签 {value} 无法转换为 0..=255 的字节")]
    LabelOutOfRange { index: usize, value: f32 },

    #[error("数据量不匹配: shape {shape:?} 需要 {expected} 个元素，但提供了 {actual} 个")]
    ShapeMismatch {
        shape: [usize; 3],
        expected: usize,
        actual: usize,
    },

    #[error("不支持的文件格式 '{file}'，支持的扩展名: {supported:?}")]
    UnsupportedFormat { file: String, supported: Vec<String> },

    #[error("无法访问文件 {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("下载 {url} 失败: {message}")]
    Fetch { url: String, message: String },

    #[error("参数错误: {0}")]
    Configuration(String),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

impl HeatError {
    /// 包装一个带路径的 I/O 错误
    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HeatError::Resource {
            path: path.into(),
            source,
        }
    }

    /// 归入三大类之一
    pub fn kind(&self) -> ErrorKind {
        match self {
            HeatError::UnsupportedVersion { .. }
            | HeatError::UnsupportedDatatype { .. }
            | HeatError::InvalidDimensions { .. }
            | HeatError::Truncated { .. }
            | HeatError::LabelOutOfRange { .. }
            | HeatError::ShapeMismatch { .. }
            | HeatError::UnsupportedFormat { .. } => ErrorKind::Format,
            HeatError::Resource { .. }
            | HeatError::Fetch { .. }
            | HeatError::Io(_)
            | HeatError::Json(_) => ErrorKind::Resource,
            HeatError::Configuration(_) => ErrorKind::Configuration,
        }
    }
}
