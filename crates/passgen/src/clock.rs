//! 时钟抽象
//!
//! 派生函数通过 [`Clock`] 读取当前时间，测试中可以注入固定时间戳。

use crate::error::{PassgenError, PassgenResult};
use std::time::{SystemTime, UNIX_EPOCH};

/// 提供 Unix 秒级时间戳的时钟
pub trait Clock: Send + Sync {
    /// 当前时间（自 Unix 纪元起的秒数）
    fn now_secs(&self) -> PassgenResult<u64>;
}

/// 读取系统墙钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> PassgenResult<u64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| PassgenError::Clock(format!("system time before Unix epoch: {e}")))
    }
}

/// 固定时间戳时钟
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_secs(&self) -> PassgenResult<u64> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(1_700_000_000).now_secs().unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_system_clock_is_after_2023() {
        let now = SystemClock.now_secs().unwrap();
        assert!(now > 1_700_000_000);
    }
}
