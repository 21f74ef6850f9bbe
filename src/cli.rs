// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines the import subcommand and global connection flags

use crate::api::DEFAULT_API_BASE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notion-md-import")]
#[command(about = "Import local Markdown files into Notion as new pages", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Notion integration token (overrides NOTION_API_KEY)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Disable throttling (not recommended)
    #[arg(long, global = true)]
    pub no_throttle: bool,

    /// Throttle range in ms (min:max)
    #[arg(long, global = true, value_parser = parse_throttle_range)]
    pub throttle_ms: Option<(u64, u64)>,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

fn parse_throttle_range(s: &str) -> Result<(u64, u64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected format: min:max".into());
    }

    let min = parts[0].parse().map_err(|_| "Invalid min value")?;
    let max = parts[1].parse().map_err(|_| "Invalid max value")?;

    if min > max {
        return Err("min must be <= max".into());
    }

    Ok((min, max))
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Import a Markdown file as a new child page
    Import {
        /// Markdown file path
        file: PathBuf,

        /// Parent page id or URL (overrides NOTION_PAGE_ID)
        #[arg(short, long)]
        page: Option<String>,

        /// Page title (defaults to front matter title, then file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Convert and batch locally without calling Notion
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_throttle_range_valid() {
        let result = parse_throttle_range("100:300").unwrap();
        assert_eq!(result, (100, 300));
    }

    #[test]
    fn test_parse_throttle_range_invalid() {
        assert!(parse_throttle_range("300:100").is_err());
        assert!(parse_throttle_range("abc:def").is_err());
        assert!(parse_throttle_range("100").is_err());
    }

    #[test]
    fn test_parse_import_command() {
        let cli = Cli::try_parse_from([
            "notion-md-import",
            "import",
            "notes.md",
            "--page",
            "abc",
            "--no-throttle",
        ])
        .unwrap();
        assert!(cli.no_throttle);
        assert_eq!(cli.api_base, "https://api.notion.com");
        match cli.command {
            Commands::Import {
                file,
                page,
                title,
                dry_run,
            } => {
                assert_eq!(file, PathBuf::from("notes.md"));
                assert_eq!(page.as_deref(), Some("abc"));
                assert!(title.is_none());
                assert!(!dry_run);
            }
        }
    }

    #[test]
    fn test_import_requires_file() {
        assert!(Cli::try_parse_from(["notion-md-import", "import"]).is_err());
    }
}
