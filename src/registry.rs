//! # 组件注册表
//!
//! 把组件类型标识符（例如 `error_page`）映射到生成器。生成器是纯函数：
//! 相同的输入必须产生相同的片段，否则缓存会返回与重新生成不一致的文档。

use std::{collections::HashMap, sync::Arc};

use log::{info, warn};

use crate::{exception::Exception, param::*, util::{indent, status_code_of}};

/// 调用生成器时传入的上下文。
#[derive(Debug, Clone, Copy)]
pub struct ComponentContext<'a> {
    /// BodyBinding 中保存的有序参数
    pub params: &'a [String],
    /// 调用方给出的响应头标识符
    pub header_id: &'a str,
    /// 已解析的响应头块：头集合文本，后接全局响应头
    pub headers: &'a str,
}

impl<'a> ComponentContext<'a> {
    pub fn param(&self, index: usize) -> Option<&'a str> {
        self.params.get(index).map(|p| p.as_str())
    }
}

/// 组件生成器。任何 `Fn(&ComponentContext) -> String` 闭包都自动实现该 trait。
pub trait ComponentGenerator: Send + Sync {
    fn generate(&self, ctx: &ComponentContext<'_>) -> String;
}

impl<F> ComponentGenerator for F
where
    F: Fn(&ComponentContext<'_>) -> String + Send + Sync,
{
    fn generate(&self, ctx: &ComponentContext<'_>) -> String {
        self(ctx)
    }
}

#[derive(Clone, Default)]
pub struct ComponentRegistry {
    generators: HashMap<String, Arc<dyn ComponentGenerator>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预先注册全部内置组件类型
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(COMPONENT_ERROR_PAGE, error_page);
        registry.register(COMPONENT_API_PROXY, api_proxy);
        registry.register(COMPONENT_STATIC_SITE, static_site);
        registry.register(COMPONENT_DATABASE_PROXY, database_proxy);
        registry
    }

    /// 绑定生成器。重复绑定会覆盖旧的生成器，这不是错误。
    pub fn register<G>(&mut self, type_id: &str, generator: G)
    where
        G: ComponentGenerator + 'static,
    {
        if self
            .generators
            .insert(type_id.to_string(), Arc::new(generator))
            .is_some()
        {
            warn!("组件类型{}被重新绑定，旧的生成器已被覆盖", type_id);
        } else {
            info!("注册组件类型：{}", type_id);
        }
    }

    pub fn resolve(&self, type_id: &str) -> Result<Arc<dyn ComponentGenerator>, Exception> {
        self.generators
            .get(type_id)
            .cloned()
            .ok_or_else(|| Exception::UnknownComponentType(type_id.to_string()))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.generators.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

// --- 内置组件 ---

/// 参数：目标状态码（或状态行），可选的错误页根目录
fn error_page(ctx: &ComponentContext<'_>) -> String {
    let code = ctx.param(0).and_then(status_code_of).unwrap_or(404);
    let root = ctx.param(1).unwrap_or("/usr/share/nginx/html");
    format!(
        r"    location / {{
        return {code};
    }}

    location = /{code}.html {{
        internal;
        root {root};
{headers}
    }}",
        code = code,
        root = root,
        headers = indent(ctx.headers, 8),
    )
}

/// 参数：后端 upstream 名称
fn api_proxy(ctx: &ComponentContext<'_>) -> String {
    let backend = ctx.param(0).unwrap_or("api_backend");
    format!(
        r#"    location /api/ {{
        proxy_pass http://{backend};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;

        # API specific settings
        proxy_read_timeout 300s;
        proxy_connect_timeout 75s;
{headers}
    }}

    location /health {{
        access_log off;
        return 200 "healthy\n";
        add_header Content-Type text/plain;
    }}"#,
        backend = backend,
        headers = indent(ctx.headers, 8),
    )
}

/// 参数：站点根目录
fn static_site(ctx: &ComponentContext<'_>) -> String {
    let root = ctx.param(0).unwrap_or("/var/www/html");
    format!(
        r#"    root {root};
    index index.html index.htm;

    location / {{
        try_files $uri $uri/ =404;
{headers}
    }}

    location ~* \.(css|js|png|jpg|jpeg|gif|ico|svg)$ {{
        expires 1y;
        add_header Cache-Control "public, immutable";
    }}

    location = /favicon.ico {{
        log_not_found off;
        access_log off;
    }}"#,
        root = root,
        headers = indent(ctx.headers, 8),
    )
}

/// 参数：后端 upstream 名称，可选的主库地址与备库地址
fn database_proxy(ctx: &ComponentContext<'_>) -> String {
    let backend = ctx.param(0).unwrap_or("db_backend");
    let location = format!(
        r"    location / {{
        proxy_pass http://{backend};
        proxy_set_header Host $host;

        # Database specific settings
        proxy_read_timeout 600s;
        proxy_connect_timeout 10s;
        proxy_send_timeout 600s;
{headers}
    }}",
        backend = backend,
        headers = indent(ctx.headers, 8),
    );
    match upstream_block(backend, ctx.param(1), ctx.param(2)) {
        Some(upstream) => format!("{}\n\n{}", upstream, location),
        None => location,
    }
}

// 至少给出一个地址时才生成 upstream 块
fn upstream_block(backend: &str, primary: Option<&str>, backup: Option<&str>) -> Option<String> {
    let mut servers = Vec::new();
    if let Some(primary) = primary.filter(|p| !p.trim().is_empty()) {
        servers.push(format!("        server {};", primary.trim()));
    }
    if let Some(backup) = backup.filter(|b| !b.trim().is_empty()) {
        servers.push(format!("        server {} backup;", backup.trim()));
    }
    if servers.is_empty() {
        return None;
    }
    Some(format!(
        "    upstream {} {{\n{}\n    }}",
        backend,
        servers.join("\n")
    ))
}
