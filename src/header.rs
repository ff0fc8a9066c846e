//! # 响应头表与响应头归一化
//!
//! `HeaderTable` 保存“标识符 → 响应头指令块”的映射，以及一份总会被追加的全局响应头。
//! `normalize` 则根据原始响应的头部映射计算一个稳定的标识符，可代替调用方提供的原始标识符。

use std::{collections::HashMap, fmt};

use log::{info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::{param::*, util::fnv1a_32};

/// 一次原始响应的头部映射，保持插入顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    entries: Vec<(String, String)>,
}

impl HeaderMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个条目。链式调用便于在测试和配置中构造映射。
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// 除去状态行之外的条目，保持原有顺序
    pub fn without_status_line(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.iter().filter(|(k, _)| !is_status_line(k))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 状态行条目：键为 `status`（大小写不敏感），或者键本身就是 `HTTP/1.1 404 Not Found` 这样的状态行
fn is_status_line(key: &str) -> bool {
    key.eq_ignore_ascii_case(STATUS_LINE_KEY) || key.starts_with("HTTP/")
}

/// 归一化后的响应头标识符。以有符号 32 位十进制显示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NormalizedHeaderKey(u32);

impl NormalizedHeaderKey {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NormalizedHeaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as i32)
    }
}

/// 计算头部映射的稳定标识符。
///
/// 去掉状态行后，按映射顺序把每个条目写成 `key: value`，以 `\n` 连接，
/// 再做 32 位 FNV-1a 哈希。注意结果依赖条目顺序，顺序不同的相同头集合会得到不同的标识符。
pub fn normalize(mapping: &HeaderMapping) -> NormalizedHeaderKey {
    let joined = mapping
        .without_status_line()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("\n");
    NormalizedHeaderKey(fnv1a_32(joined.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct HeaderTable {
    sets: HashMap<String, String>,
    global: String,
}

impl Default for HeaderTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderTable {
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
            global: GLOBAL_HEADERS.to_string(),
        }
    }

    /// 注册或覆盖一个头集合
    pub fn register(&mut self, header_id: &str, block: &str) {
        if self
            .sets
            .insert(header_id.to_string(), block.trim().to_string())
            .is_some()
        {
            warn!("响应头集合{}被覆盖", header_id);
        } else {
            info!("注册响应头集合：{}", header_id);
        }
    }

    /// 归一化头部映射，并把它渲染成 `add_header` 指令注册到归一化标识符之下
    pub fn register_mapping(&mut self, mapping: &HeaderMapping) -> NormalizedHeaderKey {
        let key = normalize(mapping);
        let block = mapping
            .without_status_line()
            .map(|(k, v)| render_header(k, v))
            .collect::<Vec<_>>()
            .join("\n");
        self.register(&key.to_string(), &block);
        key
    }

    /// 追加全局响应头
    pub fn add_global(&mut self, block: &str) {
        let block = block.trim();
        if block.is_empty() {
            return;
        }
        if !self.global.is_empty() {
            self.global.push('\n');
        }
        self.global.push_str(block);
    }

    pub fn global(&self) -> &str {
        &self.global
    }

    pub fn contains(&self, header_id: &str) -> bool {
        self.sets.contains_key(header_id)
    }

    /// 头集合文本后接全局响应头。未知标识符只得到全局响应头。
    pub fn block_for(&self, header_id: &str) -> String {
        match self.sets.get(header_id) {
            Some(set) if !set.is_empty() => format!("{}\n{}", set, self.global),
            Some(_) => self.global.clone(),
            None => {
                warn!("未知的响应头标识符：{}，只使用全局响应头", header_id);
                self.global.clone()
            }
        }
    }
}

fn render_header(key: &str, value: &str) -> String {
    if value.is_empty() {
        format!("add_header {} \"\";", key)
    } else if value.contains(char::is_whitespace) || value.contains(';') {
        format!("add_header {} \"{}\";", key, value.replace('"', "\\\""))
    } else {
        format!("add_header {} {};", key, value)
    }
}
