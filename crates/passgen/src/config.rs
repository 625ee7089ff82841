//! 密码派生服务配置

use serde::{Deserialize, Serialize};

pub const DEFAULT_PHRASE: &str = "The Tomb of Saint Nicholas";

fn default_phrase() -> String {
    DEFAULT_PHRASE.to_string()
}

fn default_service_name() -> String {
    "Password Generator API".to_string()
}

fn default_author() -> String {
    "rohan srivastav".to_string()
}

/// 派生服务配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PassgenConfig {
    /// 请求未携带 phrase 时使用的默认短语
    #[serde(default = "default_phrase")]
    pub default_phrase: String,

    /// 根路径返回的服务名称
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// 根路径返回的作者标签
    #[serde(default = "default_author")]
    pub author: String,
}

impl Default for PassgenConfig {
    fn default() -> Self {
        Self {
            default_phrase: default_phrase(),
            service_name: default_service_name(),
            author: default_author(),
        }
    }
}
