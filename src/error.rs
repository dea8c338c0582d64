use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// JSON 序列化 / 反序列化失败
    #[error("格式错误: {0}")]
    Format(String),
    /// 文档存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 文档存储错误
///
/// 批量提交被拒绝时由存储层返回，导入流程不再细分原因
#[derive(Debug, Error)]
pub enum StoreError {
    /// 单批写入数量超过存储上限
    #[error("单批写入数量 {attempted} 超过上限 {limit}")]
    BatchLimitExceeded { limit: usize, attempted: usize },
    /// 没有写入权限
    #[error("没有写入权限: {message}")]
    PermissionDenied { message: String },
    /// 存储不可达（网络中断、超时等）
    #[error("存储不可达: {source}")]
    Unavailable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 存储拒绝了本次提交
    #[error("提交被拒绝 (status: {status}): {message}")]
    Rejected { status: u16, message: String },
    /// 字段无法编码为存储格式
    #[error("字段编码失败: {0}")]
    Encode(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 未知的存储后端
    #[error("未知的存储后端: {0} (可选: memory / firestore)")]
    UnknownBackend(String),
    /// 必填配置项为空
    #[error("缺少配置项: {0}")]
    MissingValue(String),
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Format(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unavailable {
            source: Box::new(err),
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            AppError::File(FileError::NotFound { path })
        } else {
            AppError::File(FileError::ReadFailed { path, source })
        }
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

impl StoreError {
    /// 创建存储不可达错误
    pub fn unavailable(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Unavailable {
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = AppError::file_read_failed(
            "soal.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
        assert_eq!(err.to_string(), "文件错误: 文件不存在: soal.json");
    }

    #[test]
    fn test_store_error_converts_into_app_error() {
        let err: AppError = StoreError::BatchLimitExceeded {
            limit: 500,
            attempted: 501,
        }
        .into();
        assert!(matches!(
            err,
            AppError::Store(StoreError::BatchLimitExceeded { limit: 500, .. })
        ));
    }
}
