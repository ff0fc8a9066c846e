// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了配置生成引擎在组合、缓存以及输出过程中可能抛出的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了标识符解析错误、TLS 参数缺失、骨架模板损坏，以及配置加载与落盘错误。
//! - **请求级失败**：所有错误都只影响当前这一次调用，不会污染缓存或注册表。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志中。

use std::fmt;

/// 引擎处理请求过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回。引擎内部不做任何重试。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exception {
    /// 组件类型标识符没有在组件注册表中绑定生成器。
    UnknownComponentType(String),
    /// Body 标识符没有注册过对应的 BodyBinding。
    UnknownBodyId(String),
    /// TLS 参数中缺少域名，或者域名为空字符串。
    MissingDomain,
    /// TLS 参数中没有给出 server_tokens 开关。该字段没有默认值。
    MissingServerTokensFlag,
    /// 骨架模板格式非法。属于编程错误而不是运行时条件。
    MalformedSkeleton(String),
    /// 无法读取配置文件。
    ConfigUnreadable(String),
    /// 配置文件内容无法解析。
    ConfigInvalid(String),
    /// 输出协作者无法写入生成的文档。
    OutputWriteFailed(String),
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownComponentType(id) => write!(f, "Unknown component type: {}", id),
            UnknownBodyId(id) => write!(f, "Unknown body id: {}", id),
            MissingDomain => write!(f, "TLS parameters have no domain"),
            MissingServerTokensFlag => write!(f, "TLS parameters have no server_tokens flag"),
            MalformedSkeleton(reason) => write!(f, "Malformed skeleton: {}", reason),
            ConfigUnreadable(reason) => write!(f, "Couldn't read config file: {}", reason),
            ConfigInvalid(reason) => write!(f, "Invalid config file: {}", reason),
            OutputWriteFailed(reason) => write!(f, "Couldn't write generated config: {}", reason),
        }
    }
}

impl std::error::Error for Exception {}
