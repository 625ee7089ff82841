//! hashpass 基础设施库
//!
//! 为密码派生服务提供配置加载与监控指标等通用组件

pub mod config;
pub mod metrics;

// Re-export commonly used types for convenience
pub use config::{ConfigError, HashpassConfig};
