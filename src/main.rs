use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use instadon::models::types::RunOutcome;
use instadon::models::visibility::Visibility;
use instadon::{RunRequest, SourceRef, run_with_config_path};

/// Cross-post from Instagram to Mastodon
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["profile", "url"])))]
struct Args {
    /// Instagram profile name to fetch the latest post from
    profile: Option<String>,

    /// Specific Instagram post URL (or shortcode) to cross-post
    #[arg(long)]
    url: Option<String>,

    /// Mastodon post visibility
    #[arg(long, value_enum, default_value_t = Visibility::Public)]
    visibility: Visibility,

    /// Instagram session name or session file path
    #[arg(long, default_value = "kommen")]
    session: String,

    /// File to track posted Instagram IDs
    #[arg(long, default_value = "posted_instagram_ids.txt")]
    tracker: PathBuf,

    /// Mastodon account to post to
    #[arg(long)]
    account: String,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

impl Args {
    fn request(&self) -> RunRequest {
        let source = match (&self.url, &self.profile) {
            (Some(url), _) => SourceRef::Reference(url.clone()),
            (None, Some(profile)) => SourceRef::Profile(profile.clone()),
            (None, None) => unreachable!("clap enforces one source"),
        };
        RunRequest {
            source,
            visibility: self.visibility,
            session: self.session.clone(),
            tracker: self.tracker.clone(),
            account: self.account.clone(),
        }
    }

    fn source_info(&self) -> String {
        match (&self.url, &self.profile) {
            (Some(url), _) => format!("URL: {}", url),
            (None, Some(profile)) => format!("Profile: {}", profile),
            (None, None) => String::new(),
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<RunOutcome> {
    let outcome = run_with_config_path(&args.config, &args.request())
        .await
        .with_context(|| format!("cross-post to {} failed", args.account))?;
    Ok(outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from `.env` file into std::env (optional)
    dotenv().ok();

    let args = Args::parse();

    match run(&args).await {
        Ok(outcome @ RunOutcome::Posted { .. }) => {
            let root = outcome.root_post().map(|p| p.id.to_string()).unwrap_or_default();
            println!("Successfully created Mastodon post!");
            println!("Post ID: {}", root);
            if let RunOutcome::Posted { content_id, posts, .. } = &outcome {
                if posts.len() > 1 {
                    println!("Thread length: {}", posts.len());
                }
                println!("Instagram shortcode: {}", content_id);
            }
            println!("Source: {}", args.source_info());
            println!("Mastodon account: {}", args.account);
            println!("Visibility: {}", args.visibility);
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Skipped { content_id, content_url }) => {
            println!("Post already processed: {}", content_id);
            println!("Instagram URL: {}", content_url);
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Failed { reason }) => {
            eprintln!("Error: {}", reason);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
