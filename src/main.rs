// ABOUTME: CLI entrypoint for notion-md-import command
// ABOUTME: Handles logging setup, error exit codes, and command dispatch

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use notion_md_import::{
    auth::{load_dotenv, resolve_parent_page, resolve_token},
    cli::{Cli, Commands},
    dry_run_summary, ImportRequest, Importer, MarkdownConverter, NotionConnector, Progress,
    Result, SourceDocument,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("warn,notion_md_import=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("notion-md-import: [E{}] {}", e.exit_code(), e);
        if let Some(progress) = e.partial_progress() {
            eprintln!(
                "notion-md-import: page {} exists with {} appended batch(es); batch {} and later were not imported",
                progress.page_id, progress.batches_appended, progress.failed_batch_index
            );
        }
        std::process::exit(e.exit_code());
    }
}

fn connector(cli: &Cli) -> NotionConnector {
    let connector = NotionConnector::new().with_api_base(cli.api_base.clone());
    if cli.no_throttle {
        connector.disable_throttle()
    } else if let Some((min, max)) = cli.throttle_ms {
        connector.with_throttle(min, max)
    } else {
        connector
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} batches") {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

async fn run(cli: Cli) -> Result<()> {
    load_dotenv();

    match cli.command.clone() {
        Commands::Import {
            file,
            page,
            title,
            dry_run,
        } => {
            let doc = SourceDocument::load(&file, title)?;

            if dry_run {
                let importer = Importer::new(MarkdownConverter::new(), connector(&cli));
                let batches = importer.plan(&doc.markdown)?;
                println!("{}", dry_run_summary(&doc.title, &batches));
                return Ok(());
            }

            let token = resolve_token(cli.token.clone())?;
            let parent = resolve_parent_page(page)?;

            let pb = progress_bar();
            let bar = pb.clone();
            let importer = Importer::new(MarkdownConverter::new(), connector(&cli)).on_progress(
                move |event| match event {
                    Progress::Converted { batches, .. } => bar.set_length((*batches).max(1) as u64),
                    Progress::PageCreated { .. } | Progress::BatchAppended { .. } => bar.inc(1),
                },
            );

            let request = ImportRequest::new(token, parent, doc.title, doc.markdown);
            let result = importer.run(&request).await;
            pb.finish_and_clear();

            let page_id = result?;
            println!("{}", page_id);
        }
    }

    Ok(())
}
