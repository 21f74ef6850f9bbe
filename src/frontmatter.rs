// ABOUTME: YAML front matter detection for Markdown sources
// ABOUTME: Splits the header from the body and exposes the title field

use crate::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,
}

/// Splits a leading `---` delimited YAML header from `text`.
///
/// Returns the parsed header (if any) and the remaining body. Text without a
/// closed header is returned whole, as is a header that opens with a blank
/// line or whose YAML is not a mapping: both are ordinary Markdown rules.
pub fn split_frontmatter(text: &str) -> Result<(Option<Frontmatter>, &str)> {
    let rest = match text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    {
        Some(rest) => rest,
        None => return Ok((None, text)),
    };
    if rest.starts_with('\n') || rest.starts_with("\r\n") {
        return Ok((None, text));
    }

    let (yaml, body) = match find_closing(rest) {
        Some(split) => split,
        None => return Ok((None, text)),
    };

    if yaml.trim().is_empty() {
        return Ok((Some(Frontmatter::default()), body));
    }

    let value: serde_yaml::Value = serde_yaml::from_str(yaml)
        .map_err(|e| Error::Frontmatter(format!("Failed to parse front matter: {}", e)))?;
    match value {
        serde_yaml::Value::Null => Ok((Some(Frontmatter::default()), body)),
        serde_yaml::Value::Mapping(_) => {
            let fm: Frontmatter = serde_yaml::from_value(value).map_err(|e| {
                Error::Frontmatter(format!("Failed to read front matter: {}", e))
            })?;
            Ok((Some(fm), body))
        }
        _ => Ok((None, text)),
    }
}

/// The Markdown body with any front matter header removed. Headers that
/// fail to parse are left in place.
pub fn strip_frontmatter(text: &str) -> &str {
    split_frontmatter(text).map_or(text, |(_, body)| body)
}

fn find_closing(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body.trim_start_matches(['\r', '\n'])));
        }
        offset += line.len();
    }
    None
}
