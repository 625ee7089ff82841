//! 统一配置管理系统
//!
//! hashpass 的全部配置项（绑定地址、派生服务、可观测性）都在这里定义，
//! 配置文件使用 TOML 格式，每个字段都有默认值，空文件即为合法配置。

pub mod bind;
pub mod tracing;

pub use crate::config::bind::{BindConfig, HttpBindConfig};
pub use crate::config::tracing::TracingConfig;
pub use passgen::PassgenConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file does not exist: {0:?}")]
    NotFound(PathBuf),

    #[error("Path is not a valid file: {0:?}")]
    NotAFile(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// hashpass 主配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HashpassConfig {
    /// 服务器实例名称，用于日志与追踪中区分节点
    #[serde(default = "default_name")]
    pub name: String,

    /// 运行环境标识：dev / prod / test
    #[serde(default = "default_env")]
    pub env: String,

    /// 网络绑定配置
    #[serde(default)]
    pub bind: BindConfig,

    /// 密码派生服务配置
    #[serde(default)]
    pub passgen: PassgenConfig,

    /// 可观测性配置（日志 + 追踪）
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// 可观测性配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ObservabilityConfig {
    /// 过滤级别（EnvFilter 语法，如 "info,tower_http=debug"）
    #[serde(default = "default_filter_level")]
    pub filter_level: String,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub tracing: TracingConfig,
}

/// 日志配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    /// 日志输出目标："console"（默认）或 "file"
    #[serde(default = "default_log_output")]
    pub output: String,

    /// output = "file" 时是否按天轮转
    #[serde(default)]
    pub rotate: bool,

    /// output = "file" 时的日志目录
    #[serde(default = "default_log_path")]
    pub path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter_level: default_filter_level(),
            log: LogConfig::default(),
            tracing: TracingConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: default_log_output(),
            rotate: false,
            path: default_log_path(),
        }
    }
}

fn default_name() -> String {
    "hashpass-default".to_string()
}

fn default_env() -> String {
    "dev".to_string()
}

fn default_log_output() -> String {
    "console".to_string()
}

fn default_log_path() -> String {
    "logs/".to_string()
}

fn default_filter_level() -> String {
    "info".to_string()
}

impl Default for HashpassConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            env: default_env(),
            bind: BindConfig::default(),
            passgen: PassgenConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl HashpassConfig {
    pub fn tracing_config(&self) -> &TracingConfig {
        &self.observability.tracing
    }

    pub fn observability_config(&self) -> &ObservabilityConfig {
        &self.observability
    }

    /// HTTP 绑定地址
    pub fn bind_addr(&self) -> String {
        self.bind.http.bind_addr()
    }

    /// HTTP 监听的 `SocketAddr`
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        self.bind.http.socket_addr()
    }

    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }
        if !path_ref.is_file() {
            return Err(ConfigError::NotAFile(path_ref.to_path_buf()));
        }

        let content = std::fs::read_to_string(path_ref)?;
        Ok(Self::from_toml(&content)?)
    }

    /// 从 TOML 字符串加载配置
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 将配置序列化为 TOML 字符串
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// 验证配置有效性
    ///
    /// 返回发现的全部问题；以 "Warning:" 开头的条目不阻止启动。
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Instance name cannot be empty".to_string());
        }

        if !["dev", "prod", "test"].contains(&self.env.as_str()) {
            errors.push(format!(
                "Invalid environment '{}', must be one of: dev, prod, test",
                self.env
            ));
        }

        if self.bind.http.ip.parse::<std::net::IpAddr>().is_err() {
            errors.push(format!(
                "Invalid bind.http.ip '{}', must be a valid IP address",
                self.bind.http.ip
            ));
        }

        {
            let main_level = self
                .observability
                .filter_level
                .split(',')
                .next()
                .unwrap_or("")
                .trim();
            if !["trace", "debug", "info", "warn", "error"].contains(&main_level) {
                errors.push(format!(
                    "Invalid filter level '{}', must start with one of: trace, debug, info, warn, error",
                    self.observability.filter_level
                ));
            }
        }

        if !["console", "file"].contains(&self.observability.log.output.as_str()) {
            errors.push(format!(
                "Invalid log output '{}' (observability.log.output), must be 'console' or 'file'",
                self.observability.log.output
            ));
        }

        if let Err(e) = self.observability.tracing.validate() {
            errors.push(format!("Tracing configuration error: {e}"));
        }

        if self.passgen.default_phrase.is_empty() {
            errors.push(
                "Warning: passgen.default_phrase is empty, omitted phrases hash the timestamp alone"
                    .to_string(),
            );
        }

        if self.env == "prod" && self.bind.http.ip == "0.0.0.0" {
            errors.push(
                "Warning: listening on all interfaces over plain HTTP in prod environment"
                    .to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
