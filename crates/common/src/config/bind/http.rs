use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, IpAddr, SocketAddr};

fn default_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// HTTP 服务绑定配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpBindConfig {
    /// 绑定 IP 地址
    ///
    /// 服务实际绑定的网络接口 IP 地址。
    /// 通常使用 "0.0.0.0" 监听所有接口。
    #[serde(default = "default_ip")]
    pub ip: String,

    /// 绑定端口
    ///
    /// HTTP 服务监听的端口号，0 表示由系统分配。
    #[serde(default = "default_port")]
    pub port: u16,
}

impl HttpBindConfig {
    /// 解析后的监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        Ok(SocketAddr::new(self.ip.parse::<IpAddr>()?, self.port))
    }

    /// 可读形式的绑定地址，IPv6 主机带方括号
    pub fn bind_addr(&self) -> String {
        match self.socket_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => format!("{}:{}", self.ip, self.port),
        }
    }
}

impl Default for HttpBindConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv6_bind_addr_is_bracketed() {
        let config = HttpBindConfig {
            ip: "::1".to_string(),
            port: 8000,
        };
        assert_eq!(config.bind_addr(), "[::1]:8000");
        assert_eq!(
            config.socket_addr().unwrap(),
            "[::1]:8000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_invalid_ip_has_no_socket_addr() {
        let config = HttpBindConfig {
            ip: "not-an-ip".to_string(),
            port: 8000,
        };
        assert!(config.socket_addr().is_err());
        assert_eq!(config.bind_addr(), "not-an-ip:8000");
    }
}
