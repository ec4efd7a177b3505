//! cast-post - Validate a post and publish it to every selected platform

use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use libcrosscast::config::Config;
use libcrosscast::dispatch::Dispatcher;
use libcrosscast::error::{CrosscastError, Result};
use libcrosscast::gateway::HttpGateway;
use libcrosscast::logging::LoggingConfig;
use libcrosscast::probe::HttpProber;
use libcrosscast::settle::Settler;
use libcrosscast::types::{Draft, PlatformOptions, SnapchatPostType, YouTubeVisibility};
use libcrosscast::validate::ValidationEngine;
use libcrosscast::{Database, PlatformId, Post, ShareStatus};

#[derive(Parser, Debug)]
#[command(name = "cast-post")]
#[command(version)]
#[command(about = "Validate a post and publish it to every selected platform", long_about = None)]
struct Cli {
    /// Post body (reads from stdin if not provided)
    content: Option<String>,

    /// Post title (required by some platforms, e.g. YouTube)
    #[arg(short, long, default_value = "")]
    title: String,

    /// Target platform(s), comma-separated (defaults from config)
    #[arg(short, long)]
    platform: Option<String>,

    /// Media URL to attach (repeatable)
    #[arg(short, long = "media", value_name = "URL")]
    media: Vec<String>,

    /// Subreddit to post to (Reddit)
    #[arg(long)]
    subreddit: Option<String>,

    /// Link to attach to the Reddit post
    #[arg(long)]
    reddit_link: Option<String>,

    /// YouTube visibility: public, private, or unlisted
    #[arg(long, default_value = "public")]
    youtube_visibility: String,

    /// Snapchat post type: story, saved-story, or spotlight
    #[arg(long, default_value = "story")]
    snapchat_type: String,

    /// Ask the gateway to shorten links in the post
    #[arg(long)]
    shorten_links: bool,

    /// Validate only, do not publish
    #[arg(long)]
    validate_only: bool,

    /// Save the post without publishing it
    #[arg(short, long)]
    draft: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    LoggingConfig::from_env("error", cli.verbose).init();

    // Run the main logic and handle errors
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let draft = build_draft(&cli, &config)?;

    let prober = Arc::new(HttpProber::new(config.probe.timeout_secs)?);
    let engine = ValidationEngine::new(prober);
    let report = engine.validate(&draft).await;
    if !report.is_valid() {
        for failure in &report.failures {
            eprintln!("- {}", failure.message);
        }
        return Err(CrosscastError::InvalidInput(format!(
            "{} validation failure(s)",
            report.failures.len()
        )));
    }
    if cli.validate_only {
        println!("ok");
        return Ok(());
    }

    let db = Database::new(&config.database.path).await?;
    let gateway = Arc::new(HttpGateway::from_config(&config.gateway)?);
    let settler = Arc::new(Settler::new(
        gateway.clone(),
        db.clone(),
        config.settlement.clone(),
    ));
    let dispatcher = Dispatcher::new(gateway, db, settler);

    let post = dispatcher.submit(&draft, !cli.draft).await?;
    print_post(&post, &cli.format)?;
    Ok(())
}

fn build_draft(cli: &Cli, config: &Config) -> Result<Draft> {
    let body = match &cli.content {
        Some(content) => content.clone(),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| CrosscastError::InvalidInput(format!("failed to read stdin: {}", e)))?;
            buffer.trim_end().to_string()
        }
    };

    let platform_list = cli
        .platform
        .clone()
        .unwrap_or_else(|| config.defaults.platforms.join(","));
    let mut platforms = Vec::new();
    for name in platform_list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        platforms.push(PlatformId::from_str(name)?);
    }

    let youtube_visibility = YouTubeVisibility::from_str(&cli.youtube_visibility)
        .map_err(CrosscastError::InvalidInput)?;
    let snapchat_post_type =
        SnapchatPostType::from_str(&cli.snapchat_type).map_err(CrosscastError::InvalidInput)?;

    Ok(Draft {
        title: cli.title.clone(),
        body,
        platforms,
        media_urls: cli.media.clone(),
        options: PlatformOptions {
            subreddit: cli.subreddit.clone(),
            reddit_link: cli.reddit_link.clone(),
            youtube_visibility,
            snapchat_post_type,
            shorten_links: cli.shorten_links,
        },
    })
}

fn print_post(post: &Post, format: &str) -> Result<()> {
    match format {
        "json" => {
            let json = serde_json::to_string_pretty(post)
                .map_err(|e| CrosscastError::InvalidInput(e.to_string()))?;
            println!("{}", json);
        }
        "text" => {
            println!("Post {}", post.id);
            for share in &post.shares {
                match share.status {
                    ShareStatus::Published => println!(
                        "  {}: published {}",
                        share.platform,
                        share.public_url.as_deref().unwrap_or("")
                    ),
                    ShareStatus::Pending => println!("  {}: pending", share.platform),
                    ShareStatus::Failed => println!(
                        "  {}: failed: {}",
                        share.platform,
                        share.error_message.as_deref().unwrap_or("unknown error")
                    ),
                }
            }
        }
        other => {
            return Err(CrosscastError::InvalidInput(format!(
                "unknown output format: '{}'. Valid options: text, json",
                other
            )));
        }
    }
    Ok(())
}
