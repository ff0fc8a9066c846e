//! # 组装器
//!
//! 把 body 片段、TLS 片段等代入骨架模板的具名占位符。组装本身没有任何分支逻辑，
//! 所有判断都由上游组件完成。

use lazy_static::lazy_static;
use regex::Regex;
use serde_derive::{Deserialize, Serialize};

use crate::{exception::Exception, param::*};

lazy_static! {
    static ref SLOT_PATTERN: Regex = Regex::new(r"\{\{([^{}]*)\}\}").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    ServerTokens,
    Listen,
    ServerName,
    Certificates,
    Tls,
    Common,
    ErrorPages,
    Body,
}

impl Slot {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "server_tokens" => Some(Slot::ServerTokens),
            "listen" => Some(Slot::Listen),
            "server_name" => Some(Slot::ServerName),
            "certificates" => Some(Slot::Certificates),
            "tls" => Some(Slot::Tls),
            "common" => Some(Slot::Common),
            "error_pages" => Some(Slot::ErrorPages),
            "body" => Some(Slot::Body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Slot(Slot),
}

/// 解析过的骨架模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    pieces: Vec<Piece>,
}

impl Default for Skeleton {
    fn default() -> Self {
        // 内置骨架在单元测试中校验过
        Self::parse(BASE_SKELETON).unwrap_or(Self { pieces: Vec::new() })
    }
}

impl Skeleton {
    /// 解析骨架文本。未知占位符、缺少 `{{body}}` 或者多余的 `{{`/`}}` 都视为格式错误。
    pub fn parse(text: &str) -> Result<Self, Exception> {
        let mut pieces = Vec::new();
        let mut last = 0;
        let mut has_body = false;

        for caps in SLOT_PATTERN.captures_iter(text) {
            let (whole, name) = match (caps.get(0), caps.get(1)) {
                (Some(w), Some(n)) => (w, n.as_str().trim()),
                _ => continue,
            };
            let slot = Slot::from_name(name).ok_or_else(|| {
                Exception::MalformedSkeleton(format!(
                    "unknown slot {{{{{}}}}}, expected one of {}",
                    name,
                    SKELETON_SLOTS.join(", ")
                ))
            })?;
            push_text(&mut pieces, &text[last..whole.start()])?;
            has_body |= slot == Slot::Body;
            pieces.push(Piece::Slot(slot));
            last = whole.end();
        }
        push_text(&mut pieces, &text[last..])?;

        if !has_body {
            return Err(Exception::MalformedSkeleton(
                "missing {{body}} slot".to_string(),
            ));
        }
        Ok(Self { pieces })
    }
}

fn push_text(pieces: &mut Vec<Piece>, text: &str) -> Result<(), Exception> {
    if text.contains("{{") || text.contains("}}") {
        return Err(Exception::MalformedSkeleton(format!(
            "unbalanced placeholder near {:?}",
            text.trim()
        )));
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text.to_string()));
    }
    Ok(())
}

/// server 块级别的通用设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen_port: u16,
    pub enable_gzip: bool,
    pub enable_security_headers: bool,
    pub cert_dir: String,
    pub key_dir: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            enable_gzip: false,
            enable_security_headers: false,
            cert_dir: DEFAULT_CERT_DIR.to_string(),
            key_dir: DEFAULT_KEY_DIR.to_string(),
        }
    }
}

impl ServerSettings {
    pub fn listen_directive(&self) -> String {
        format!("listen {} ssl;", self.listen_port)
    }

    pub fn certificates(&self, domain: &str) -> String {
        format!(
            "    ssl_certificate {}/{}.crt;\n    ssl_certificate_key {}/{}.key;",
            self.cert_dir.trim_end_matches('/'),
            domain,
            self.key_dir.trim_end_matches('/'),
            domain
        )
    }

    pub fn common_directives(&self) -> String {
        let mut directives = Vec::new();
        if self.enable_gzip {
            directives.push(
                r"    # Gzip compression
    gzip on;
    gzip_types text/css text/javascript application/javascript application/json;",
            );
        }
        if self.enable_security_headers {
            directives.push(
                r#"    # Security headers
    add_header X-Frame-Options DENY;
    add_header X-Content-Type-Options nosniff;
    add_header X-XSS-Protection "1; mode=block";"#,
            );
        }
        directives.join("\n")
    }
}

/// 代入各占位符的片段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyParts {
    pub server_tokens: String,
    pub listen: String,
    pub server_name: String,
    pub certificates: String,
    pub tls: String,
    pub common: String,
    pub error_pages: String,
    pub body: String,
}

impl AssemblyParts {
    fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::ServerTokens => &self.server_tokens,
            Slot::Listen => &self.listen,
            Slot::ServerName => &self.server_name,
            Slot::Certificates => &self.certificates,
            Slot::Tls => &self.tls,
            Slot::Common => &self.common,
            Slot::ErrorPages => &self.error_pages,
            Slot::Body => &self.body,
        }
    }
}

pub fn assemble(skeleton: &Skeleton, parts: &AssemblyParts) -> String {
    let mut out = String::new();
    for piece in &skeleton.pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Slot(slot) => out.push_str(parts.get(*slot)),
        }
    }
    out
}
