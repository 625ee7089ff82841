//! Passgen - 基于时间的 SHA-256 密码派生服务
//!
//! 提供以下功能：
//! 1. `GET /generate` 与 `POST /generate`：由短语与当前 Unix 秒派生十六进制密码
//! 2. `GET /`：服务发现信息
//! 3. `GET /health`：健康检查
//! 4. `GET /docs` 与 `GET /openapi.json`：OpenAPI 文档
//!
//! 派生结果完全由 (短语, 秒级时间戳) 决定，不适合用作真正的随机密码。

pub mod clock;
pub mod config;
pub mod derive;
pub mod error;
pub mod handlers;
pub mod types;

// Re-export commonly used items
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{DEFAULT_PHRASE, PassgenConfig};
pub use derive::{DIGEST_HEX_LEN, MAX_LENGTH, MIN_LENGTH, derive, derive_password, validate_length};
pub use error::{PassgenError, PassgenResult};
pub use handlers::{
    ApiDoc, ENDPOINTS, OPENAPI_PATH, PassgenState, create_passgen_state, create_router,
    register_passgen_metrics,
};
pub use types::{
    DiscoveryResponse, ErrorResponse, GenerateBody, GenerateQuery, GenerationRequest,
    GenerationResult, HealthResponse,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passgen_state_creation() {
        let state = create_passgen_state(&PassgenConfig::default());
        let request = GenerationRequest::new(10, None, &state.config.default_phrase).unwrap();
        let result = state.generate(&request).unwrap();
        assert_eq!(result.password.len(), 10);
    }

    #[test]
    fn test_metrics_registration() {
        let registry = prometheus::Registry::new();
        assert!(register_passgen_metrics(&registry).is_ok());
        // 重复注册应报错
        assert!(register_passgen_metrics(&registry).is_err());
    }
}
