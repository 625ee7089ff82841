//! Prometheus 监控指标模块
//!
//! 持有全局 Registry，负责注册各服务的指标并导出文本格式

use lazy_static::lazy_static;
use prometheus::{Encoder, IntGauge, Registry, TextEncoder};
use std::sync::Once;

static METRICS_INIT: Once = Once::new();

lazy_static! {
    /// 全局 Prometheus Registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// 进程启动时间（Unix 秒）
    pub static ref START_TIME_SECONDS: IntGauge = IntGauge::new(
        "hashpass_start_time_seconds",
        "Unix time at which the server started"
    ).unwrap();
}

/// 注册全部指标，重复调用只注册一次
pub fn register_metrics() -> Result<(), prometheus::Error> {
    let mut result = Ok(());
    METRICS_INIT.call_once(|| {
        let register_result = (|| {
            REGISTRY.register(Box::new(START_TIME_SECONDS.clone()))?;
            passgen::register_passgen_metrics(&REGISTRY)?;
            Ok::<(), prometheus::Error>(())
        })();
        if let Err(e) = register_result {
            result = Err(e);
        }
    });
    result
}

/// 导出 Prometheus 文本格式的指标
pub fn export_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_metrics() {
        register_metrics().unwrap();
        // 第二次调用不会重复注册
        register_metrics().unwrap();

        START_TIME_SECONDS.set(1_700_000_000);
        let output = export_metrics();
        assert!(output.contains("hashpass_start_time_seconds 1700000000"));
    }
}
