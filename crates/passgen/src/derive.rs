//! 密码派生核心
//!
//! `password = hex(sha256(phrase ++ decimal(epoch_secs)))[..length]`
//!
//! 唯一的熵来源是秒级墙钟：知道短语即可在一秒的粒度上复现结果。
//! 该派生保持与既有客户端的行为兼容，不能用于生成真正的秘密。

use crate::clock::Clock;
use crate::error::{PassgenError, PassgenResult};
use crate::types::{GenerationRequest, GenerationResult};
use sha2::{Digest, Sha256};

/// 允许的最小密码长度
pub const MIN_LENGTH: usize = 1;
/// 允许的最大密码长度
pub const MAX_LENGTH: usize = 64;
/// SHA-256 摘要的十六进制长度
pub const DIGEST_HEX_LEN: usize = 64;

/// 校验请求长度位于 [MIN_LENGTH, MAX_LENGTH]
///
/// GET 与 POST 共用此函数，保证同一输入得到同样的拒绝信息。
pub fn validate_length(length: i64) -> PassgenResult<usize> {
    usize::try_from(length)
        .ok()
        .filter(|l| (MIN_LENGTH..=MAX_LENGTH).contains(l))
        .ok_or(PassgenError::LengthOutOfRange {
            requested: length,
            min: MIN_LENGTH,
            max: MAX_LENGTH,
        })
}

/// `phrase ++ timestamp` 的 SHA-256 小写十六进制摘要
pub fn digest_hex(phrase: &str, timestamp: u64) -> String {
    let input = format!("{phrase}{timestamp}");
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// 以 `clock` 的当前时间派生密码
pub fn derive_password(
    phrase: &str,
    length: usize,
    clock: &dyn Clock,
) -> PassgenResult<GenerationResult> {
    if length < MIN_LENGTH {
        return Err(PassgenError::LengthOutOfRange {
            requested: length as i64,
            min: MIN_LENGTH,
            max: MAX_LENGTH,
        });
    }

    let timestamp = clock.now_secs()?;
    let digest = digest_hex(phrase, timestamp);

    if length > digest.len() {
        return Err(PassgenError::LengthExceedsDigest {
            requested: length,
            max: digest.len(),
        });
    }

    Ok(GenerationResult {
        password: digest[..length].to_string(),
        timestamp,
        length,
    })
}

/// 对已校验的请求派生密码
pub fn derive(request: &GenerationRequest, clock: &dyn Clock) -> PassgenResult<GenerationResult> {
    derive_password(&request.phrase, request.length, clock)
}
