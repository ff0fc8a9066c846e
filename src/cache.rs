use std::{fmt, ops::Deref, sync::Arc};

use lru::LruCache;
use serde_json::Value;

use crate::tls::TlsParameters;

/// 生成好的配置文档。不可变，克隆只增加引用计数。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document(Arc<str>);

impl Document {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl Deref for Document {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 由完整参数集构造缓存键：`"body_id"-"header_id"-<键有序的 TLS 参数>`
///
/// 两个标识符都编码成 JSON 字符串，其中的 `-` 或引号不会让不同的参数组合得到同一个键。
pub fn cache_key(body_id: &str, header_id: &str, tls: &TlsParameters) -> String {
    format!(
        "{}-{}-{}",
        Value::from(body_id),
        Value::from(header_id),
        tls.canonical()
    )
}

pub struct DocumentCache {
    cache: LruCache<String, Document>,
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCache {
    // 条目不会自动过期，只有 clear 会移除
    pub fn new() -> Self {
        Self {
            cache: LruCache::unbounded(),
        }
    }

    // 查询
    pub fn find(&mut self, key: &str) -> Option<Document> {
        self.cache.get(key).cloned()
    }

    // 放入。键已存在时保留先写入的文档并返回它
    pub fn push(&mut self, key: String, document: Document) -> Document {
        if let Some(existing) = self.cache.peek(&key) {
            return existing.clone();
        }
        self.cache.put(key, document.clone());
        document
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::from(text.to_string())
    }

    #[test]
    fn test_cache_creation() {
        let cache = DocumentCache::new();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_push_and_find() {
        let mut cache = DocumentCache::new();
        cache.push("k1".to_string(), doc("server {}"));
        assert_eq!(cache.len(), 1);

        let found = cache.find("k1");
        assert_eq!(found, Some(doc("server {}")));
    }

    #[test]
    fn test_cache_first_writer_wins() {
        let mut cache = DocumentCache::new();
        let first = cache.push("k1".to_string(), doc("first"));
        let second = cache.push("k1".to_string(), doc("second"));
        assert_eq!(first, doc("first"));
        assert_eq!(second, doc("first"));
        assert_eq!(cache.find("k1"), Some(doc("first")));
    }

    #[test]
    fn test_cache_never_evicts() {
        let mut cache = DocumentCache::new();
        for i in 0..1000 {
            cache.push(format!("k{}", i), doc("x"));
        }
        assert_eq!(cache.len(), 1000);
        assert!(cache.find("k0").is_some());
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = DocumentCache::new();
        cache.push("k1".to_string(), doc("a"));
        cache.push("k2".to_string(), doc("b"));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.find("k1").is_none());
    }

    #[test]
    fn test_cache_not_found() {
        let mut cache = DocumentCache::new();
        assert!(cache.find("nonexistent").is_none());
    }

    #[test]
    fn test_cache_key_shape() {
        let tls = TlsParameters::for_domain("example.com").server_tokens(false);
        let key = cache_key("25637482", "-1002489980", &tls);
        assert!(key.starts_with("\"25637482\"-\"-1002489980\"-{"));
        assert!(key.ends_with(&tls.canonical()));
    }

    #[test]
    fn test_cache_key_ids_with_dashes_do_not_collide() {
        let tls = TlsParameters::for_domain("example.com").server_tokens(false);
        assert_ne!(cache_key("a-b", "c", &tls), cache_key("a", "b-c", &tls));
        assert_ne!(cache_key("a", "-1", &tls), cache_key("a-", "1", &tls));
        assert_ne!(cache_key("a\"-\"b", "c", &tls), cache_key("a", "b\"-\"c", &tls));
    }

    #[test]
    fn test_document_shares_text() {
        let a = doc("server {}");
        let b = a.clone();
        assert_eq!(a.as_str(), "server {}");
        assert_eq!(&*b, "server {}");
        assert_eq!(b.to_string(), "server {}");
    }
}
