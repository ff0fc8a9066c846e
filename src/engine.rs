// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 配置生成引擎
//!
//! `Engine` 是由调用方显式构造并持有的服务对象，内部包含两类共享可变状态：
//! - 注册表（组件注册表、响应头表、body 绑定、server 设置、骨架模板），由一把读写锁保护；
//! - 文档缓存，由一把互斥锁保护。
//!
//! 生成流程：缓存查询 → (未命中) Body 解析 → TLS 组合 → 组装 → 写入缓存 → 返回。
//! 两个并发的未命中可能都会计算，但只有先写入的文档会被保留，两个调用方拿到的文档相同。

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};

use crate::{
    assembler::{assemble, AssemblyParts, ServerSettings, Skeleton},
    body::{BodyResolver, ResolvedBody},
    cache::{cache_key, Document, DocumentCache},
    exception::Exception,
    header::{self, HeaderMapping, HeaderTable, NormalizedHeaderKey},
    registry::{ComponentGenerator, ComponentRegistry},
    tls::{self, TlsFragment, TlsParameters},
    util::indent,
};

struct Tables {
    registry: ComponentRegistry,
    headers: HeaderTable,
    bodies: BodyResolver,
    settings: ServerSettings,
    skeleton: Skeleton,
}

pub struct Engine {
    tables: RwLock<Tables>,
    cache: Mutex<DocumentCache>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// 带全部内置组件、默认设置和默认骨架的引擎
    pub fn new() -> Self {
        Self::with_registry(ComponentRegistry::with_builtins())
    }

    pub fn with_registry(registry: ComponentRegistry) -> Self {
        Self {
            tables: RwLock::new(Tables {
                registry,
                headers: HeaderTable::new(),
                bodies: BodyResolver::new(),
                settings: ServerSettings::default(),
                skeleton: Skeleton::default(),
            }),
            cache: Mutex::new(DocumentCache::new()),
        }
    }

    fn read_tables(&self) -> RwLockReadGuard<'_, Tables> {
        match self.tables.read() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("注册表锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }

    fn write_tables(&self) -> RwLockWriteGuard<'_, Tables> {
        match self.tables.write() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("注册表锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, DocumentCache> {
        match self.cache.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }

    // --- 注册 API ---

    pub fn register_component<G>(&self, type_id: &str, generator: G)
    where
        G: ComponentGenerator + 'static,
    {
        self.write_tables().registry.register(type_id, generator);
    }

    pub fn register_header_set(&self, header_id: &str, block: &str) {
        self.write_tables().headers.register(header_id, block);
    }

    /// 以归一化标识符注册一份原始响应头，返回该标识符
    pub fn register_header_mapping(&self, mapping: &HeaderMapping) -> NormalizedHeaderKey {
        self.write_tables().headers.register_mapping(mapping)
    }

    pub fn add_global_headers(&self, block: &str) {
        self.write_tables().headers.add_global(block);
    }

    pub fn register_body(
        &self,
        body_id: &str,
        component_type: &str,
        params: Vec<String>,
    ) -> Result<(), Exception> {
        let mut tables = self.write_tables();
        let Tables {
            registry, bodies, ..
        } = &mut *tables;
        bodies.register_body(registry, body_id, component_type, params)
    }

    pub fn set_server_settings(&self, settings: ServerSettings) {
        self.write_tables().settings = settings;
    }

    /// 替换骨架模板。格式错误时保留原骨架。
    pub fn set_skeleton(&self, text: &str) -> Result<(), Exception> {
        let skeleton = Skeleton::parse(text)?;
        self.write_tables().skeleton = skeleton;
        info!("骨架模板已替换");
        Ok(())
    }

    // --- 生成 API ---

    pub fn compose(&self, params: &TlsParameters) -> Result<TlsFragment, Exception> {
        tls::compose(params)
    }

    pub fn resolve_body(&self, body_id: &str, header_id: &str) -> Result<ResolvedBody, Exception> {
        let tables = self.read_tables();
        tables
            .bodies
            .resolve_body(&tables.registry, &tables.headers, body_id, header_id)
    }

    pub fn normalize(&self, mapping: &HeaderMapping) -> NormalizedHeaderKey {
        header::normalize(mapping)
    }

    /// body 绑定的组件类型，输出文件命名时使用
    pub fn component_type_of(&self, body_id: &str) -> Option<String> {
        self.read_tables()
            .bodies
            .binding(body_id)
            .map(|b| b.component_type.clone())
    }

    /// 不经过缓存直接生成文档
    pub fn generate(
        &self,
        body_id: &str,
        header_id: &str,
        params: &TlsParameters,
    ) -> Result<Document, Exception> {
        let tables = self.read_tables();
        let resolved =
            tables
                .bodies
                .resolve_body(&tables.registry, &tables.headers, body_id, header_id)?;
        let fragment = tls::compose(params)?;
        let domain = params.domain().ok_or(Exception::MissingDomain)?;

        let settings = &tables.settings;
        let parts = AssemblyParts {
            server_tokens: fragment.server_tokens,
            listen: settings.listen_directive(),
            server_name: domain.to_string(),
            certificates: settings.certificates(domain),
            tls: fragment.block,
            common: settings.common_directives(),
            error_pages: indent(&resolved.error_exclusion, 4),
            body: resolved.fragment,
        };
        Ok(Document::from(assemble(&tables.skeleton, &parts)))
    }

    pub fn get_or_generate(
        &self,
        body_id: &str,
        header_id: &str,
        params: &TlsParameters,
    ) -> Result<Document, Exception> {
        let key = cache_key(body_id, header_id, params);
        let hit = self.lock_cache().find(&key);
        if let Some(document) = hit {
            debug!("缓存命中：{}", key);
            return Ok(document);
        }
        debug!("缓存未命中：{}", key);

        let document = self.generate(body_id, header_id, params)?;
        Ok(self.lock_cache().push(key, document))
    }

    pub fn clear(&self) {
        self.lock_cache().clear();
        info!("文档缓存已清空");
    }

    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }
}
