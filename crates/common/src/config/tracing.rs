//! OpenTelemetry 追踪配置
//!
//! 仅在编译时启用 `opentelemetry` feature 后生效。

use serde::{Deserialize, Serialize};

fn default_service_name() -> String {
    "hashpass".to_string()
}

fn default_endpoint() -> String {
    "http://127.0.0.1:4317".to_string()
}

fn default_sample_ratio() -> f64 {
    1.0
}

/// OTLP 追踪导出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// 是否启用追踪导出（默认关闭）
    #[serde(default)]
    pub enable: bool,

    /// 追踪后端中显示的服务名
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// OTLP gRPC 端点，例如 Jaeger 或 OpenTelemetry Collector 的 4317 端口
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// 采样比例，取值 [0.0, 1.0]
    #[serde(default = "default_sample_ratio")]
    pub sample_ratio: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enable: false,
            service_name: default_service_name(),
            endpoint: default_endpoint(),
            sample_ratio: default_sample_ratio(),
        }
    }
}

impl TracingConfig {
    /// 校验追踪配置，未启用时总是通过
    pub fn validate(&self) -> Result<(), String> {
        if !self.enable {
            return Ok(());
        }
        if self.endpoint.trim().is_empty() {
            return Err("Tracing endpoint cannot be empty when tracing is enabled".to_string());
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err("Tracing endpoint must start with http:// or https://".to_string());
        }
        if !(0.0..=1.0).contains(&self.sample_ratio) {
            return Err(format!(
                "Tracing sample_ratio must be within [0.0, 1.0], got {}",
                self.sample_ratio
            ));
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enable
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}
