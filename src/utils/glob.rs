// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use regex::Regex;

/// 通配符模式
///
/// 与 Redis `MATCH` 语义一致的子集：`*` 匹配任意长度，`?` 匹配单个字符，
/// `\` 转义下一个字符。其余字符按字面匹配。
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// 编译通配符模式
    ///
    /// # 参数
    ///
    /// * `pattern` - 通配符模式，例如 `user:*`
    ///
    /// # 返回值
    ///
    /// * `Ok(GlobPattern)` - 编译后的模式
    /// * `Err(regex::Error)` - 模式无法转换为正则表达式
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        expr.push_str(&regex::escape(&escaped.to_string()));
                    }
                }
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');

        Ok(Self {
            source: pattern.to_string(),
            regex: Regex::new(&expr)?,
        })
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}
