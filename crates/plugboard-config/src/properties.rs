// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `.properties` files: `key=value` lines as used by module manifests and
//! module configuration.
//!
//! Supported syntax: `#` and `!` comments, `=`, `:` or whitespace as the
//! separator, trailing-backslash line continuation and the usual escapes
//! (`\t`, `\n`, `\r`, `\\`, `\uXXXX`). Parsing never fails; malformed escapes
//! are kept literally.

use std::collections::BTreeMap;

use figment::value::{Dict, Map, Value};
use figment::{Metadata, Profile, Provider};
use tracing::debug;

/// Parsed key/value pairs, last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in logical_lines(content) {
            let (key, value) = split_entry(&line);
            if !key.is_empty() {
                entries.insert(key, value);
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Comma-separated list value, trimmed, blanks dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(split_list).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Nested dictionary where each `.` in a key opens a table.
    ///
    /// When both `a` and `a.b` are present the table wins.
    pub fn to_dict(&self) -> Dict {
        let mut root = Dict::new();
        for (key, value) in &self.entries {
            let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
            if parts.is_empty() {
                continue;
            }
            insert_nested(&mut root, &parts, Value::from(value.clone()));
        }
        root
    }
}

/// Splits a comma-separated value into trimmed, non-blank items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn insert_nested(dict: &mut Dict, parts: &[&str], value: Value) {
    let [head, rest @ ..] = parts else {
        return;
    };
    if rest.is_empty() {
        if matches!(dict.get(*head), Some(Value::Dict(..))) {
            debug!(key = *head, "properties key shadowed by nested table");
            return;
        }
        dict.insert((*head).to_string(), value);
        return;
    }

    let entry = dict
        .entry((*head).to_string())
        .or_insert_with(|| Value::from(Dict::new()));
    if !matches!(entry, Value::Dict(..)) {
        *entry = Value::from(Dict::new());
    }
    if let Value::Dict(_, child) = entry {
        insert_nested(child, rest, value);
    }
}

/// Joins continuation lines and drops comments and blanks.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for raw in content.lines() {
        let line = raw.trim_start();
        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }
        let (body, continues) = strip_continuation(line);
        current.push_str(body);
        continuing = continues;
        if !continuing {
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// An odd number of trailing backslashes continues the line.
fn strip_continuation(line: &str) -> (&str, bool) {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 1 {
        (&line[..line.len() - 1], true)
    } else {
        (line, false)
    }
}

fn split_entry(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    key.push(unescape_char(escaped, &mut chars));
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                // Whitespace may be followed by an explicit separator.
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if matches!(chars.peek(), Some('=') | Some(':')) {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }

    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(unescape_char(escaped, &mut chars));
            }
        } else {
            value.push(c);
        }
    }
    (key, value)
}

fn unescape_char(c: char, rest: &mut std::iter::Peekable<std::str::Chars<'_>>) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{000C}',
        'u' => {
            let hex: String = rest.clone().take(4).collect();
            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                Some(decoded) if hex.len() == 4 => {
                    for _ in 0..4 {
                        rest.next();
                    }
                    decoded
                }
                _ => 'u',
            }
        }
        other => other,
    }
}

/// Figment provider over a parsed properties file.
#[derive(Debug, Clone)]
pub struct PropertiesProvider {
    name: String,
    properties: Properties,
}

impl PropertiesProvider {
    /// `name` shows up in Figment metadata, e.g. `alpha:config/app.properties`.
    pub fn new(name: impl Into<String>, properties: Properties) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    pub fn string(name: impl Into<String>, content: &str) -> Self {
        Self::new(name, Properties::parse(content))
    }
}

impl Provider for PropertiesProvider {
    fn metadata(&self) -> Metadata {
        Metadata::named(format!("properties `{}`", self.name))
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Ok(Profile::Default.collect(self.properties.to_dict()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Figment;

    #[test]
    fn parses_separators_and_comments() {
        let props = Properties::parse(
            "# comment\n! also comment\n\na=1\nb : 2\nc 3\n  d   =   spaced value  \n",
        );
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("spaced value  "));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn joins_continuation_lines() {
        let props = Properties::parse("list = a, \\\n    b, \\\n    c\n");
        assert_eq!(props.get("list"), Some("a, b, c"));
        assert_eq!(props.get_list("list"), vec!["a", "b", "c"]);
    }

    #[test]
    fn escaped_backslash_does_not_continue() {
        let props = Properties::parse("path=C:\\\\\nnext=1\n");
        assert_eq!(props.get("path"), Some("C:\\"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn decodes_escapes() {
        let props = Properties::parse("key\\ with\\ space=tab\\there\nu=\\u0041\n");
        assert_eq!(props.get("key with space"), Some("tab\there"));
        assert_eq!(props.get("u"), Some("A"));
    }

    #[test]
    fn empty_value_and_last_wins() {
        let props = Properties::parse("empty=\nx=1\nx=2\n");
        assert_eq!(props.get("empty"), Some(""));
        assert_eq!(props.get("x"), Some("2"));
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(" a , ,b,"), vec!["a", "b"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn provider_nests_dotted_keys() {
        let provider =
            PropertiesProvider::string("alpha:config/app.properties", "greeter.prefix=hi\nname=a\n");
        let figment = Figment::from(provider);
        let prefix: String = figment.extract_inner("greeter.prefix").unwrap();
        let name: String = figment.extract_inner("name").unwrap();
        assert_eq!(prefix, "hi");
        assert_eq!(name, "a");
    }

    #[test]
    fn nested_table_wins_over_scalar() {
        let dict = Properties::parse("a=1\na.b=2\n").to_dict();
        assert!(matches!(dict.get("a"), Some(Value::Dict(..))));
    }
}
