//! 派生服务数据类型定义

use crate::derive::validate_length;
use crate::error::PassgenResult;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// GET /generate 的查询参数
#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GenerateQuery {
    /// Length of password (1-64 characters)
    #[param(minimum = 1, maximum = 64)]
    pub length: i64,
    /// Base phrase for password generation
    #[serde(default)]
    pub phrase: Option<String>,
}

/// POST /generate 的请求体
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateBody {
    /// Length of password (1-64 characters)
    #[schema(minimum = 1, maximum = 64)]
    pub length: i64,
    /// Base phrase; the configured default is used when absent or null
    #[serde(default)]
    pub phrase: Option<String>,
}

/// 已通过范围校验的生成请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub length: usize,
    pub phrase: String,
}

impl GenerationRequest {
    /// 校验长度并补全默认短语
    pub fn new(length: i64, phrase: Option<String>, default_phrase: &str) -> PassgenResult<Self> {
        let length = validate_length(length)?;
        Ok(Self {
            length,
            phrase: phrase.unwrap_or_else(|| default_phrase.to_string()),
        })
    }

    pub fn from_query(query: GenerateQuery, default_phrase: &str) -> PassgenResult<Self> {
        Self::new(query.length, query.phrase, default_phrase)
    }

    pub fn from_body(body: GenerateBody, default_phrase: &str) -> PassgenResult<Self> {
        Self::new(body.length, body.phrase, default_phrase)
    }
}

/// 生成结果，同时作为 /generate 的响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerationResult {
    /// `length` 个小写十六进制字符
    pub password: String,
    /// 生成时间（Unix 秒）
    pub timestamp: u64,
    pub length: usize,
}

/// GET / 的响应体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscoveryResponse {
    pub message: String,
    pub endpoints: Vec<String>,
    pub author: String,
}

/// GET /health 的响应体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
}

/// 错误响应体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
    /// HTTP 状态码
    pub code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PassgenError;

    #[test]
    fn test_default_phrase_applied() {
        let req = GenerationRequest::new(8, None, "default").unwrap();
        assert_eq!(req.phrase, "default");
        assert_eq!(req.length, 8);

        let req = GenerationRequest::new(8, Some(String::new()), "default").unwrap();
        assert_eq!(req.phrase, "");
    }

    #[test]
    fn test_out_of_range_rejected() {
        for length in [-1, 0, 65, i64::MAX] {
            let err = GenerationRequest::new(length, None, "p").unwrap_err();
            assert!(matches!(err, PassgenError::LengthOutOfRange { .. }));
        }
    }

    #[test]
    fn test_body_null_phrase_uses_default() {
        let body: GenerateBody = serde_json::from_str(r#"{"length": 4, "phrase": null}"#).unwrap();
        let req = GenerationRequest::from_body(body, "fallback").unwrap();
        assert_eq!(req.phrase, "fallback");
    }
}
