//! # TLS 组合器
//!
//! 根据 `TlsParameters` 生成 TLS / 安全相关的指令块，以及 `server_tokens` 指令。

use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::{exception::Exception, param::*};

/// TLS 参数。线上格式中所有字段都是可选的，缺省值在组合时才确定。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsParameters {
    /// 必填，不能为空
    pub domain: Option<String>,
    /// 缺省为 `TLSv1.2 TLSv1.3`
    pub ssl_protocols: Option<String>,
    /// 缺省为内置的加密套件列表
    pub ciphers: Option<String>,
    /// 缺省开启
    pub hsts: Option<bool>,
    /// 必填，没有缺省值
    pub server_tokens: Option<bool>,
}

impl TlsParameters {
    pub fn for_domain(domain: &str) -> Self {
        Self {
            domain: Some(domain.to_string()),
            ..Self::default()
        }
    }

    pub fn ssl_protocols(mut self, protocols: &str) -> Self {
        self.ssl_protocols = Some(protocols.to_string());
        self
    }

    pub fn ciphers(mut self, ciphers: &str) -> Self {
        self.ciphers = Some(ciphers.to_string());
        self
    }

    pub fn hsts(mut self, enabled: bool) -> Self {
        self.hsts = Some(enabled);
        self
    }

    pub fn server_tokens(mut self, visible: bool) -> Self {
        self.server_tokens = Some(visible);
        self
    }

    /// 非空域名
    pub fn domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    fn resolved_protocols(&self) -> &str {
        self.ssl_protocols.as_deref().unwrap_or(DEFAULT_SSL_PROTOCOLS)
    }

    fn resolved_ciphers(&self) -> &str {
        self.ciphers.as_deref().unwrap_or(DEFAULT_CIPHERS)
    }

    fn resolved_hsts(&self) -> bool {
        self.hsts.unwrap_or(true)
    }

    /// 键有序的 JSON 表示，先填入缺省值，因此结构上等价的参数得到同一个字符串。
    pub fn canonical(&self) -> String {
        let mut map: BTreeMap<&str, Value> = BTreeMap::new();
        map.insert("domain", self.domain.clone().into());
        map.insert("ssl_protocols", self.resolved_protocols().into());
        map.insert("ciphers", self.resolved_ciphers().into());
        map.insert("hsts", self.resolved_hsts().into());
        map.insert("server_tokens", self.server_tokens.into());
        // BTreeMap<&str, Value> 的序列化不会失败
        serde_json::to_string(&map).unwrap_or_default()
    }
}

/// 组合结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFragment {
    /// 协议、加密套件与 HSTS 指令，已缩进到 server 块内
    pub block: String,
    /// `server_tokens on;` 或 `server_tokens off;`
    pub server_tokens: String,
}

pub fn compose(params: &TlsParameters) -> Result<TlsFragment, Exception> {
    if params.domain().is_none() {
        return Err(Exception::MissingDomain);
    }
    let tokens = params
        .server_tokens
        .ok_or(Exception::MissingServerTokensFlag)?;

    let mut lines = vec![
        format!("ssl_protocols {};", params.resolved_protocols()),
        format!("ssl_ciphers {};", params.resolved_ciphers()),
        "ssl_prefer_server_ciphers on;".to_string(),
    ];
    if params.resolved_hsts() {
        lines.push(HSTS_DIRECTIVE.to_string());
    }
    let block = lines
        .iter()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n");

    let server_tokens = if tokens {
        "server_tokens on;"
    } else {
        "server_tokens off;"
    };

    Ok(TlsFragment {
        block,
        server_tokens: server_tokens.to_string(),
    })
}
