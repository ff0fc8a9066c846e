use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 纯状态码 "404"，或者状态行 "HTTP/1.1 404 Not Found"
    static ref STATUS_CODE_PATTERN: Regex =
        Regex::new(r"^\s*(?:HTTP/\d(?:\.\d)?\s+)?([1-5]\d\d)(?:\s.*)?$").unwrap();
}

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32 位 FNV-1a 哈希。与平台和进程无关，适合做稳定的查找键。
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// 从参数中提取状态码。无法识别时返回 `None`。
pub fn status_code_of(param: &str) -> Option<u16> {
    STATUS_CODE_PATTERN
        .captures(param)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 给多行文本的每个非空行加上缩进
pub fn indent(block: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    block
        .lines()
        .map(|line| {
            let line = line.trim();
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
