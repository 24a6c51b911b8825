use crate::core::error::CompatError;
use crate::utils::fs::is_likely_binary;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Css,
    Vue,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "css" => Some(Self::Css),
            "vue" => Some(Self::Vue),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Vue => "vue",
        }
    }
}

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid css comment regex"));
static STYLE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>(.*?)</style\s*>").expect("valid vue style block regex")
});
static PROPERTY_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?[A-Za-z_][A-Za-z0-9_-]*$").expect("valid property name regex")
});

/// Reads a stylesheet or single-file component and returns its property names.
/// A `max_bytes` of 0 disables the size limit.
pub fn extract_from_file(path: &Path, kind: SourceKind, max_bytes: u64) -> Result<BTreeSet<String>> {
    let empty = || CompatError::EmptyPropertySet {
        file: path.display().to_string(),
    };

    let metadata =
        fs::metadata(path).with_context(|| format!("failed reading {}", path.display()))?;
    if max_bytes > 0 && metadata.len() > max_bytes {
        return Err(CompatError::FileTooLarge {
            file: path.display().to_string(),
            bytes: metadata.len(),
            limit: max_bytes,
        }
        .into());
    }

    let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    if is_likely_binary(&bytes) {
        return Err(empty().into());
    }

    let properties = extract_properties(kind, &String::from_utf8_lossy(&bytes));
    if properties.is_empty() {
        return Err(empty().into());
    }
    Ok(properties)
}

pub fn extract_properties(kind: SourceKind, content: &str) -> BTreeSet<String> {
    match kind {
        SourceKind::Css => declaration_names(content),
        SourceKind::Vue => STYLE_BLOCK_RE
            .captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .flat_map(|block| declaration_names(block.as_str()))
            .collect(),
    }
}

/// Splits on `{`, `;` and `}` outside strings and parentheses. Text closed by
/// `{` is a selector or at-rule prelude; text closed by `;` or `}` is a
/// declaration. SCSS/Less `//` line comments are dropped.
fn declaration_names(css: &str) -> BTreeSet<String> {
    let css = COMMENT_RE.replace_all(css, " ");
    let mut names = BTreeSet::new();
    let mut segment = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut paren_depth = 0_usize;
    let mut chars = css.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(open) = quote {
            segment.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                segment.push(ch);
            }
            '(' => {
                paren_depth += 1;
                segment.push(ch);
            }
            ')' => {
                paren_depth = paren_depth.saturating_sub(1);
                segment.push(ch);
            }
            '/' if paren_depth == 0 && chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        segment.push('\n');
                        break;
                    }
                }
            }
            '{' if paren_depth == 0 => segment.clear(),
            ';' | '}' if paren_depth == 0 => {
                insert_declaration(&segment, &mut names);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }
    insert_declaration(&segment, &mut names);

    names
}

fn insert_declaration(segment: &str, names: &mut BTreeSet<String>) {
    let Some((name, _)) = segment.split_once(':') else {
        return;
    };
    let name = name.trim();
    if PROPERTY_NAME_RE.is_match(name) {
        names.insert(name.to_ascii_lowercase());
    }
}
