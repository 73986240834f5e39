use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use renovate_playground::present::{classify, clean_message, status_label};
use renovate_playground::runner::ReplayRunner;
use renovate_playground::{
    Playground, PlaygroundConfig, RunForm, SessionSnapshot, StartOutcome, DEFAULT_CONFIG_TEXT,
};

#[derive(Parser, Debug)]
#[command(name = "renovate-playground", version, about = "Follow a Renovate run and tabulate its dependency updates")]
struct Cli {
    /// GitHub repository, e.g. https://github.com/owner/repo
    #[arg(long = "repo", value_name = "URL")]
    repository_url: String,
    /// GitHub personal access token
    #[arg(long, env = "RENOVATE_TOKEN", hide_env_values = true)]
    token: String,
    /// Renovate configuration (JSON); defaults to config:recommended
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    /// Recorded Renovate log (newline-delimited JSON) to replay
    #[arg(long = "replay", value_name = "PATH")]
    replay_path: PathBuf,
    /// Playground settings (JSON)
    #[arg(long = "settings", value_name = "PATH")]
    settings_path: Option<PathBuf>,
    /// Print the dependency table as JSON instead of text
    #[arg(long)]
    json: bool,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let settings = match &args.settings_path {
        Some(path) => PlaygroundConfig::from_file(path)
            .with_context(|| format!("load settings from {}", path.display()))?,
        None => PlaygroundConfig::default(),
    };
    let config_text = match &args.config_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read Renovate config {}", path.display()))?,
        None => DEFAULT_CONFIG_TEXT.to_string(),
    };

    let runner = ReplayRunner::new(&args.replay_path)
        .with_capacity(settings.channel_capacity)
        .with_delay(Duration::from_millis(settings.replay_delay_ms));
    let mut playground = Playground::new(runner, settings);

    let form = RunForm::new(&args.repository_url, &args.token).with_config(config_text);
    let outcome = playground.start(&form).await.context("start run")?;
    info!(?outcome, "run requested");

    if outcome == StartOutcome::Started {
        playground.wait().await;
    }

    let snapshot = playground.snapshot();
    print_logs(&snapshot);
    if args.json {
        let json = serde_json::to_string_pretty(&snapshot.dependencies)
            .context("serialize dependency table")?;
        println!("{json}");
    } else {
        print_dependencies(&snapshot);
    }

    if outcome != StartOutcome::Started {
        bail!("run did not start");
    }
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn print_logs(snapshot: &SessionSnapshot) {
    for entry in &snapshot.logs {
        let class = classify(entry);
        println!("{} {} {}", entry.time, class.icon(), clean_message(&entry.message));
    }
}

fn print_dependencies(snapshot: &SessionSnapshot) {
    if snapshot.dependencies.is_empty() {
        println!("\nNo dependency updates found.");
        return;
    }

    println!(
        "\n{:<16} {:<40} {:<16} {:<16} {:<16}",
        "TYPE", "NAME", "CURRENT", "NEW", "STATUS"
    );
    for dep in &snapshot.dependencies {
        println!(
            "{:<16} {:<40} {:<16} {:<16} {:<16}",
            dep.datasource,
            dep.name,
            dep.current_version,
            dep.new_version,
            status_label(dep.status)
        );
        if let Some(url) = &dep.registry_url {
            println!("{:<16} {}", "", url);
        }
    }
}
