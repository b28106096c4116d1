//! Parsing of collection `enable` scripts.
//!
//! Only `export NAME=value` lines are read. Inside a value two references are
//! expanded against the current process environment:
//!
//! - `${VAR}` becomes the value of `VAR`, or "" when unset
//! - `${VAR:+:${ANY}}` becomes ":" followed by the value of `VAR` when it is
//!   set, or "" when it is not
//!
//! Anything else, including other `$` forms, is kept as written. Parsed values
//! never refer to each other.

use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::runtime::Runtime;

/// Variables exported by an activation script, in first-assignment order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentMapping {
    entries: Vec<(String, String)>,
}

impl EnvironmentMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = EnvironmentMapping::new();
        for (name, value) in iter {
            mapping.insert(name, value);
        }
        mapping
    }
}

impl IntoIterator for EnvironmentMapping {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Piece of an exported value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    /// `${NAME}`
    Bare(&'a str),
    /// `${NAME:+:${OTHER}}`; only `NAME` is consulted
    Guarded(&'a str),
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Length of the leading `[A-Za-z0-9_]*` run.
fn word_len(s: &str) -> usize {
    s.bytes().take_while(|b| is_word_byte(*b)).count()
}

/// Parse a reference at the start of `s` (which starts with `${`).
///
/// Returns the segment and the number of bytes it spans.
fn parse_reference(s: &str) -> Option<(Segment<'_>, usize)> {
    let body = s.strip_prefix("${")?;
    let name_len = word_len(body);
    if name_len == 0 {
        return None;
    }
    let name = &body[..name_len];
    let after = &body[name_len..];

    if after.starts_with('}') {
        return Some((Segment::Bare(name), 2 + name_len + 1));
    }

    let guard = after.strip_prefix(":+:${")?;
    let inner_len = word_len(guard);
    if inner_len > 0 && guard[inner_len..].starts_with("}}") {
        return Some((Segment::Guarded(name), 2 + name_len + 5 + inner_len + 2));
    }
    None
}

/// Split a value into literal text and references.
fn tokenize(value: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = value;

    while let Some(pos) = rest.find("${") {
        match parse_reference(&rest[pos..]) {
            Some((segment, len)) => {
                if pos > 0 {
                    segments.push(Segment::Literal(&rest[..pos]));
                }
                segments.push(segment);
                rest = &rest[pos + len..];
            }
            None => {
                // Not a reference; keep the `$` and rescan after it.
                segments.push(Segment::Literal(&rest[..pos + 1]));
                rest = &rest[pos + 1..];
            }
        }
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    segments
}

/// Split `export NAME=value` into name and value.
fn parse_export(line: &str) -> Option<(&str, &str)> {
    let assignment = line.strip_prefix("export ")?;
    let name_len = word_len(assignment);
    if name_len == 0 {
        return None;
    }
    let value = assignment[name_len..].strip_prefix('=')?;
    Some((&assignment[..name_len], value))
}

/// Reads collection activation scripts into an [`EnvironmentMapping`].
pub struct ActivationFileParser<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> ActivationFileParser<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Parse the script at `path`.
    ///
    /// A missing file yields an empty mapping: the collection is simply not
    /// installed yet.
    #[tracing::instrument(skip(self))]
    pub fn parse(&self, path: &Path) -> Result<EnvironmentMapping> {
        if !self.runtime.exists(path) {
            debug!("Activation file {:?} does not exist.", path);
            return Ok(EnvironmentMapping::new());
        }
        let content = self.runtime.read_to_string(path)?;
        Ok(self.parse_str(&content))
    }

    /// Parse script content. Later assignments of a name win.
    pub fn parse_str(&self, content: &str) -> EnvironmentMapping {
        let mut mapping = EnvironmentMapping::new();
        for line in content.lines() {
            if let Some((name, value)) = parse_export(line) {
                mapping.insert(name, self.expand(value));
            }
        }
        mapping
    }

    fn expand(&self, value: &str) -> String {
        tokenize(value)
            .into_iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.to_string(),
                Segment::Bare(name) => self.runtime.env_var(name).unwrap_or_default(),
                Segment::Guarded(name) => match self.runtime.env_var(name) {
                    Ok(current) => format!(":{}", current),
                    Err(_) => String::new(),
                },
            })
            .collect()
    }
}
