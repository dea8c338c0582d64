use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError, FileError};

/// 指向 TOML 配置文件的环境变量
pub const CONFIG_PATH_ENV: &str = "QUESTION_IMPORT_CONFIG";

/// 存储后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// 进程内存储（测试 / dry-run）
    Memory,
    /// Firestore REST 接口
    Firestore,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "firestore" => Ok(StoreBackend::Firestore),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 存储后端
    pub store_backend: StoreBackend,
    // --- Firestore 配置 ---
    pub firestore_project_id: String,
    pub firestore_database: String,
    pub firestore_api_base_url: String,
    /// OAuth2 access token（Bearer）
    pub firestore_token: String,
    /// HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 导入配置 ---
    /// 题目集合名称
    pub questions_collection: String,
    /// 单批最大写入数量
    pub max_batch_writes: usize,
    /// 界面上最多显示的错误条数
    pub error_display_limit: usize,
    /// 模板输出文件
    pub template_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            firestore_project_id: String::new(),
            firestore_database: "(default)".to_string(),
            firestore_api_base_url: "https://firestore.googleapis.com/v1".to_string(),
            firestore_token: String::new(),
            request_timeout_secs: 30,
            questions_collection: "questions".to_string(),
            max_batch_writes: 500,
            error_display_limit: 5,
            template_file: "template-soal.json".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 → TOML 文件（可选）→ 环境变量，后者覆盖前者
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let base = match path.map(Path::to_path_buf).or(env_path.map(Into::into)) {
            Some(path) => Self::from_toml_file(&path)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides(|name| std::env::var(name).ok())?;
        config.check()?;
        Ok(config)
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(display.clone(), e))?;
        toml::from_str(&content).map_err(|source| {
            AppError::File(FileError::TomlParseFailed {
                path: display,
                source,
            })
        })
    }

    /// 用环境变量覆盖已有配置
    ///
    /// 无法解析的值直接报错，不回退到默认值
    pub fn with_env_overrides<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STORE_BACKEND") {
            self.store_backend = v.parse()?;
        }
        if let Some(v) = lookup("FIRESTORE_PROJECT_ID") {
            self.firestore_project_id = v;
        }
        if let Some(v) = lookup("FIRESTORE_DATABASE") {
            self.firestore_database = v;
        }
        if let Some(v) = lookup("FIRESTORE_API_BASE_URL") {
            self.firestore_api_base_url = v;
        }
        if let Some(v) = lookup("FIRESTORE_TOKEN") {
            self.firestore_token = v;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", v, "u64")?;
        }
        if let Some(v) = lookup("QUESTIONS_COLLECTION") {
            self.questions_collection = v;
        }
        if let Some(v) = lookup("MAX_BATCH_WRITES") {
            self.max_batch_writes = parse_env("MAX_BATCH_WRITES", v, "usize")?;
        }
        if let Some(v) = lookup("ERROR_DISPLAY_LIMIT") {
            self.error_display_limit = parse_env("ERROR_DISPLAY_LIMIT", v, "usize")?;
        }
        if let Some(v) = lookup("TEMPLATE_FILE") {
            self.template_file = v;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_env("VERBOSE_LOGGING", v, "bool")?;
        }
        Ok(self)
    }

    /// 检查后端所需的必填项
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.questions_collection.trim().is_empty() {
            return Err(ConfigError::MissingValue("questions_collection".to_string()));
        }
        if self.store_backend == StoreBackend::Firestore {
            if self.firestore_project_id.trim().is_empty() {
                return Err(ConfigError::MissingValue("firestore_project_id".to_string()));
            }
            if self.firestore_token.trim().is_empty() {
                return Err(ConfigError::MissingValue("firestore_token".to_string()));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str, value: String, expected_type: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value,
        expected_type: expected_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_toml_values_fill_missing_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            store_backend = "firestore"
            firestore_project_id = "kuis-anak"
            max_batch_writes = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Firestore);
        assert_eq!(config.firestore_project_id, "kuis-anak");
        assert_eq!(config.max_batch_writes, 100);
        assert_eq!(config.questions_collection, "questions");
        assert_eq!(config.error_display_limit, 5);
        assert_eq!(config.template_file, "template-soal.json");
    }

    #[test]
    fn test_env_overrides_beat_file_values() {
        let base = Config {
            max_batch_writes: 100,
            ..Config::default()
        };
        let config = base
            .with_env_overrides(lookup_from(&[
                ("MAX_BATCH_WRITES", "20"),
                ("QUESTIONS_COLLECTION", "soal"),
            ]))
            .unwrap();

        assert_eq!(config.max_batch_writes, 20);
        assert_eq!(config.questions_collection, "soal");
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let err = Config::default()
            .with_env_overrides(lookup_from(&[("ERROR_DISPLAY_LIMIT", "lima")]))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarParseFailed { ref var_name, .. }) if var_name == "ERROR_DISPLAY_LIMIT"
        ));

        let err = Config::default()
            .with_env_overrides(lookup_from(&[("STORE_BACKEND", "mongo")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::UnknownBackend(_))));
    }

    #[test]
    fn test_firestore_backend_requires_project_and_token() {
        let config = Config {
            store_backend: StoreBackend::Firestore,
            ..Config::default()
        };
        assert!(matches!(
            config.check(),
            Err(ConfigError::MissingValue(ref key)) if key == "firestore_project_id"
        ));

        let config = Config {
            store_backend: StoreBackend::Firestore,
            firestore_project_id: "kuis-anak".to_string(),
            firestore_token: "ya29.token".to_string(),
            ..Config::default()
        };
        assert!(config.check().is_ok());
    }
}
