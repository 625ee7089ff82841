//! 密码派生服务错误定义

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::types::ErrorResponse;

/// 密码派生服务错误类型
#[derive(Error, Debug)]
pub enum PassgenError {
    /// 请求长度超出允许范围 [MIN_LENGTH, MAX_LENGTH]
    #[error("Length must be between {min} and {max} characters (got {requested})")]
    LengthOutOfRange { requested: i64, min: usize, max: usize },

    /// 请求长度超过摘要的十六进制长度
    ///
    /// 边界校验正确时不可达，仅作为派生函数内部的不变量守卫
    #[error("Requested length ({requested}) exceeds maximum hash length ({max})")]
    LengthExceedsDigest { requested: usize, max: usize },

    /// 无法解析的查询参数或请求体
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 系统时钟错误（早于 Unix 纪元等）
    #[error("Clock error: {0}")]
    Clock(String),

    /// 内部服务器错误
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl PassgenError {
    /// 是否为客户端输入错误
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PassgenError::LengthOutOfRange { .. }
                | PassgenError::LengthExceedsDigest { .. }
                | PassgenError::InvalidRequest(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for PassgenError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if self.is_client_error() {
            self.to_string()
        } else {
            // 不向客户端暴露内部错误详情
            tracing::error!("Internal error: {:?}", self);
            "Error generating password".to_string()
        };

        let body = Json(ErrorResponse {
            detail,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// 派生服务结果类型别名
pub type PassgenResult<T> = Result<T, PassgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let err = PassgenError::LengthOutOfRange {
            requested: 65,
            min: 1,
            max: 64,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Length must be between 1 and 64 characters (got 65)"
        );

        let err = PassgenError::LengthExceedsDigest {
            requested: 70,
            max: 64,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Requested length (70) exceeds maximum hash length (64)"
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response = PassgenError::Clock("system time before epoch".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "Error generating password");
        assert_eq!(json["code"], 500);
    }
}
