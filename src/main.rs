//! Wiring & DI. Entry point: parse the CLI, bootstrap adapters, inject into services, dispatch.
//! No business logic here.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use finnews::adapters::ai::{MockAiAdapter, OpenAiAdapter};
use finnews::adapters::http::{self, AppState};
use finnews::adapters::market::{DisabledMarketData, YahooQuoteAdapter};
use finnews::adapters::persistence::{
    FsReportStore, JsonArticleFiles, JsonSourceCatalog, JsonUrlLedger, SqliteRepo,
};
use finnews::adapters::search::{GoogleSearchAdapter, MockSearchAdapter};
use finnews::adapters::ui::tui::TuiInputPort;
use finnews::adapters::web::HttpFetcher;
use finnews::domain;
use finnews::ports::{AiPort, ArticleFilesPort, InputPort, MarketDataPort, SearchPort};
use finnews::shared::config::{AppConfig, load_tag_config};
use finnews::usecases::{ArchiveQuery, IngestService, ReportService, Summariser, Tagger};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "finnews", version, about = "Finance news reports and article archive")]
struct Cli {
    /// Without a subcommand the interactive menu starts.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate one report and print a JSON summary
    Generate { topic: String },
    /// Crawl feed sources, summarise, tag and index new articles
    Ingest {
        /// Only this source id
        #[arg(long)]
        source: Option<String>,
    },
    /// List archived articles carrying all --tag values and any --subtag value
    Query {
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long = "subtag")]
        subtags: Vec<String>,
    },
    /// Delete indexed articles whose path contains DATE
    Prune { date: String },
    /// Check a Markdown report against the report template
    Lint { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found"),
    }

    let cli = Cli::parse();
    let cfg = AppConfig::load()?;

    match cli.command {
        Some(Command::Serve { host, port }) => {
            let reports = build_report_service(&cfg)?;
            let addr = format!(
                "{}:{}",
                host.unwrap_or_else(|| cfg.host_or_default()),
                port.unwrap_or_else(|| cfg.port_or_default())
            );
            info!(output_dir = %cfg.output_dir_or_default().display(), "starting API");
            http::serve(Arc::new(AppState::new(reports)), &addr).await?;
        }
        Some(Command::Generate { topic }) => {
            let out = build_report_service(&cfg)?.generate(&topic).await?;
            let summary = serde_json::json!({
                "status": "completed",
                "session_id": out.session_id,
                "topic": out.topic,
                "markdown_file": cfg.output_dir_or_default().join(&out.markdown_file),
                "generated_at": out.generated_at.to_rfc3339(),
                "total_urls": out.all_source_urls.len(),
                "all_source_urls": out.all_source_urls,
                "lint_warnings": out.lint.warning_count(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Some(Command::Ingest { source }) => {
            let ingest = build_ingest_service(&cfg).await?;
            let stats = ingest.run(source.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Some(Command::Query { tags, subtags }) => {
            let archive = build_archive(&cfg).await?;
            for path in archive.find(&tags, &subtags).await? {
                println!("{}", path);
            }
        }
        Some(Command::Prune { date }) => {
            let removed = build_archive(&cfg).await?.prune(&date).await?;
            println!("{} articles removed", removed);
        }
        Some(Command::Lint { file }) => {
            let md = tokio::fs::read_to_string(&file).await?;
            let report = domain::lint(&md);
            for issue in &report.issues {
                match issue.line {
                    Some(line) => println!("{}:{}: {}", file.display(), line, issue.message),
                    None => println!("{}: {}", file.display(), issue.message),
                }
            }
            println!(
                "{} errors, {} warnings, {} stories, {} sources",
                report.error_count(),
                report.warning_count(),
                report.story_count,
                report.source_url_count
            );
            if !report.is_valid() {
                anyhow::bail!("{} does not follow the report template", file.display());
            }
        }
        None => {
            finnews::adapters::ui::init_ui();
            let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
                Arc::new(build_report_service(&cfg)?),
                Arc::new(build_ingest_service(&cfg).await?),
                Arc::new(build_archive(&cfg).await?),
            ));
            input_port.run().await?;
        }
    }

    Ok(())
}

fn build_ai(cfg: &AppConfig) -> Arc<dyn AiPort> {
    match cfg.llm_api_key() {
        Some(key) => {
            info!(
                model = %cfg.llm_model_or_default(),
                url = %cfg.llm_api_url_or_default(),
                "LLM enabled with OpenAI-compatible adapter"
            );
            Arc::new(
                OpenAiAdapter::new(cfg.llm_api_url_or_default(), key, cfg.llm_model_or_default())
                    .with_embeddings(cfg.embedding_url.clone(), cfg.embedding_model_or_default()),
            )
        }
        None => {
            warn!("FIN_NEWS_LLM_API_KEY / GOOGLE_API_KEY not set, using mock AI adapter");
            Arc::new(MockAiAdapter::new())
        }
    }
}

fn build_report_service(cfg: &AppConfig) -> anyhow::Result<ReportService> {
    let search: Arc<dyn SearchPort> = match (cfg.search_api_key(), &cfg.search_engine_id) {
        (Some(key), Some(cx)) if cfg.is_search_configured() => {
            info!("web search enabled with Google Custom Search");
            Arc::new(GoogleSearchAdapter::new(
                cfg.search_endpoint_or_default(),
                key,
                cx.clone(),
            ))
        }
        _ => {
            warn!("search key or engine id not set, using mock search adapter");
            Arc::new(MockSearchAdapter::new())
        }
    };
    let market: Arc<dyn MarketDataPort> = if cfg.is_market_enabled() {
        Arc::new(YahooQuoteAdapter::new(cfg.market_endpoint_or_default()))
    } else {
        info!("market data disabled");
        Arc::new(DisabledMarketData)
    };
    let output_dir = cfg.output_dir_or_default();
    std::fs::create_dir_all(&output_dir)?;

    Ok(ReportService::new(
        build_ai(cfg),
        search,
        market,
        Arc::new(FsReportStore::new(output_dir)),
        cfg.report_settings(),
    ))
}

async fn build_ingest_service(cfg: &AppConfig) -> anyhow::Result<IngestService> {
    let data_dir = cfg.data_dir_or_default();
    let ai = build_ai(cfg);
    let files: Arc<dyn ArticleFilesPort> = Arc::new(JsonArticleFiles::new(data_dir.join("articles")));
    let index = Arc::new(SqliteRepo::connect(&data_dir, "articles").await?);
    let fetcher = HttpFetcher::new(
        Duration::from_secs(cfg.fetch_timeout_secs_or_default()),
        cfg.fetch_retries_or_default(),
    )?;
    let tags = load_tag_config(&cfg.tags_path_or_default())?;
    info!(
        data_dir = %data_dir.display(),
        proper = tags.keywords_proper.len(),
        common = tags.keywords_common.len(),
        "ingestion configured"
    );

    Ok(IngestService::new(
        Arc::new(fetcher),
        Arc::clone(&files),
        Arc::new(JsonUrlLedger::new(data_dir.join("urls"))),
        index,
        Arc::new(JsonSourceCatalog::new(cfg.sources_path_or_default())),
        Summariser::new(Arc::clone(&ai), Arc::clone(&files), cfg.concurrency_or_default()),
        Tagger::new(ai, files, tags, cfg.similarity_threshold_or_default()),
        cfg.concurrency_or_default(),
    ))
}

async fn build_archive(cfg: &AppConfig) -> anyhow::Result<ArchiveQuery> {
    let index = SqliteRepo::connect(cfg.data_dir_or_default(), "articles").await?;
    Ok(ArchiveQuery::new(Arc::new(index)))
}
