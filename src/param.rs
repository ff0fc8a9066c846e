// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 配置生成参数与常量模块
//!
//! 该模块定义了 `vhostgen` 生成 nginx 配置时使用的固定参数，包括：
//! - 错误码排除指令所依据的参考状态码集合。
//! - TLS 默认协议、默认加密套件与 HSTS 指令。
//! - 全局响应头与基础骨架模板。

use lazy_static::lazy_static;

/// 错误码排除指令的参考集合，顺序即输出顺序
pub const REFERENCE_ERROR_CODES: [u16; 7] = [400, 401, 403, 405, 500, 502, 503];

/// 未指定协议列表时使用的 TLS 协议
pub const DEFAULT_SSL_PROTOCOLS: &str = "TLSv1.2 TLSv1.3";

/// 未指定加密套件时使用的默认列表（Mozilla intermediate 配置）
pub const DEFAULT_CIPHERS: &str = "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305:\
DHE-RSA-AES128-GCM-SHA256:DHE-RSA-AES256-GCM-SHA384";

/// HSTS 响应头指令
pub const HSTS_DIRECTIVE: &str =
    r#"add_header Strict-Transport-Security "max-age=31536000; includeSubDomains" always;"#;

/// 默认的全局响应头，每个 body 片段都会附带
pub const GLOBAL_HEADERS: &str = "add_header X-Content-Type-Options nosniff always;";

/// 响应头映射中表示状态行的键名（大小写不敏感）
pub const STATUS_LINE_KEY: &str = "status";

/// 默认监听端口
pub const DEFAULT_LISTEN_PORT: u16 = 443;

/// 证书与私钥的默认存放目录
pub const DEFAULT_CERT_DIR: &str = "/etc/ssl/certs";
pub const DEFAULT_KEY_DIR: &str = "/etc/ssl/private";

/// 生成文件默认的输出目录
pub const DEFAULT_OUTPUT_DIR: &str = "nginx_configs";

/// 基础骨架模板。`{{slot}}` 形式的占位符会被组装器替换。
pub const BASE_SKELETON: &str = r"{{server_tokens}}

server {
    {{listen}}
    server_name {{server_name}};

{{certificates}}
{{tls}}
{{common}}
{{error_pages}}
{{body}}
}
";

lazy_static! {
    /// 骨架模板允许出现的全部占位符名称。
    pub static ref SKELETON_SLOTS: Vec<&'static str> = {
        vec![
            "server_tokens",
            "listen",
            "server_name",
            "certificates",
            "tls",
            "common",
            "error_pages",
            "body",
        ]
    };
}

/// 内置组件类型标识符
pub const COMPONENT_ERROR_PAGE: &str = "error_page";
pub const COMPONENT_API_PROXY: &str = "api_proxy";
pub const COMPONENT_STATIC_SITE: &str = "static_site";
pub const COMPONENT_DATABASE_PROXY: &str = "database_proxy";
