//! 结构标签解析
//!
//! 标签沿用 `key:"value" key2:"value2"` 约定。本模块只读取标签，从不改写原始文本

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s:"]+):"((?:[^"\\]|\\.)*)""#).expect("标签正则表达式无效")
});

/// 忽略字段的标签值
pub const IGNORE_VALUE: &str = "-";

/// 结构标签视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructTag<'a> {
    raw: &'a str,
}

impl<'a> StructTag<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    /// 按出现顺序列出全部键值对
    pub fn entries(&self) -> Vec<(&'a str, String)> {
        TAG_PAIR
            .captures_iter(self.raw)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str();
                let value = caps.get(2)?.as_str();
                Some((key, unescape(value)))
            })
            .collect()
    }

    /// 查找键对应的值，键重复时取第一个
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// 任一指定键的值为 `-` 时视为忽略
    pub fn is_ignored<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        self.entries()
            .iter()
            .any(|(k, v)| v == IGNORE_VALUE && keys.iter().any(|key| key.as_ref() == *k))
    }
}

fn unescape(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
