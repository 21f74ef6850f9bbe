// ABOUTME: Credential and parent page discovery with precedence chain
// ABOUTME: CLI flag → environment (optionally seeded from .env)

use crate::util::normalize_page_id;
use crate::{Error, Result};
use std::env;
use tracing::{debug, warn};

pub const TOKEN_ENV: &str = "NOTION_API_KEY";
pub const PAGE_ENV: &str = "NOTION_PAGE_ID";

/// Loads `.env` from the working directory into the process environment.
/// A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("ignoring unreadable .env: {}", e),
    }
}

pub fn resolve_token(cli_token: Option<String>) -> Result<String> {
    pick(cli_token, env::var(TOKEN_ENV).ok()).ok_or_else(|| {
        Error::Auth(format!(
            "No Notion integration token found. Provide via --token or {} (env or .env)",
            TOKEN_ENV
        ))
    })
}

/// Parent page from flag or environment, normalized from URL form.
pub fn resolve_parent_page(cli_page: Option<String>) -> Result<String> {
    pick(cli_page, env::var(PAGE_ENV).ok())
        .map(|page| normalize_page_id(&page))
        .ok_or_else(|| {
            Error::InvalidRequest(format!(
                "No parent page given. Provide via --page or {}",
                PAGE_ENV
            ))
        })
}

fn pick(flag: Option<String>, env_value: Option<String>) -> Option<String> {
    flag.into_iter()
        .chain(env_value)
        .find(|value| !value.trim().is_empty())
}
