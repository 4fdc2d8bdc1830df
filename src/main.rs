use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Args, Parser, Subcommand};
use powerfeed::config::{self, AppConfig};
use powerfeed::dedup::is_similar_to_existing;
use powerfeed::domain::{Comment, PowerUp};
use powerfeed::editor;
use powerfeed::generate::{self, RecentPost};
use powerfeed::logging;
use powerfeed::render::thread::render_thread;
use powerfeed::thread;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Comment threads and near-duplicate filtering for the tips feed.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Log at debug level (overridden by `POWERFEED_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build and print ranked comment threads from a JSON array of comments.
    Thread(ThreadCommand),
    /// List a comment and every reply under it, as deleted together.
    Cascade {
        /// JSON array of comments for one item.
        comments: PathBuf,
        /// Id of the comment being deleted.
        id: String,
    },
    /// Check a comment body against the configured length limit.
    ValidateComment {
        body: String,
    },
    /// Report whether a title is a near-duplicate of existing titles.
    Check(CheckCommand),
    /// Validate and de-duplicate tips from a model response.
    FilterTips(FilterTipsCommand),
    /// Validate and de-duplicate polls from a model response.
    FilterPolls(FilterCommand),
    /// Print the "do not repeat" prompt context for recent posts.
    Context {
        /// JSON array of `{title, summary}` objects.
        recent: PathBuf,
    },
    /// Inspect or edit powerfeed configuration.
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
struct ThreadCommand {
    /// JSON array of comments for one item.
    comments: PathBuf,

    /// JSON array of `{comment_id, user_id}` power-up rows.
    #[arg(long)]
    power_ups: Option<PathBuf>,

    /// Print the tree as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CheckCommand {
    candidate: String,

    /// JSON array of existing titles.
    #[arg(long)]
    existing: PathBuf,

    /// Similarity threshold (0.0 to 1.0); defaults to the configured value.
    #[arg(long, value_parser = parse_threshold)]
    threshold: Option<f64>,
}

#[derive(Debug, Args)]
struct FilterCommand {
    /// File holding the raw model response.
    response: PathBuf,

    /// JSON array of existing titles or questions.
    #[arg(long)]
    existing: PathBuf,

    /// Similarity threshold (0.0 to 1.0); defaults to the configured value.
    #[arg(long, value_parser = parse_threshold)]
    threshold: Option<f64>,
}

#[derive(Debug, Args)]
struct FilterTipsCommand {
    #[command(flatten)]
    filter: FilterCommand,

    /// JSON array of existing topic names, used to plan new topics.
    #[arg(long)]
    topics: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("config_action")
        .required(true)
        .multiple(false)
        .args(["edit", "path"])
))]
struct ConfigCommand {
    /// Open the config file in $VISUAL/$EDITOR/nvim/vim/vi.
    #[arg(long)]
    edit: bool,

    /// Print the config file path.
    #[arg(long)]
    path: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Command::Thread(command) => {
            handle_thread_command(command, &config::load_or_create()?).await
        }
        Command::Cascade { comments, id } => {
            let comments: Vec<Comment> = read_json(&comments).await?;
            for target in thread::cascade_delete_targets(&comments, &id) {
                println!("{target}");
            }
            Ok(())
        }
        Command::ValidateComment { body } => {
            let config = config::load_or_create()?;
            let body = thread::validate_comment_body(&body, config.max_comment_length)?;
            println!("{body}");
            Ok(())
        }
        Command::Check(command) => {
            let config = config::load_or_create()?;
            let existing: Vec<String> = read_json(&command.existing).await?;
            let threshold = command.threshold.unwrap_or(config.dedup_threshold);
            let verdict = if is_similar_to_existing(&command.candidate, &existing, threshold) {
                "duplicate"
            } else {
                "unique"
            };
            println!("{verdict}");
            Ok(())
        }
        Command::FilterTips(command) => {
            handle_filter_tips(command, &config::load_or_create()?).await
        }
        Command::FilterPolls(command) => {
            handle_filter_polls(command, &config::load_or_create()?).await
        }
        Command::Context { recent } => {
            let recent: Vec<RecentPost> = read_json(&recent).await?;
            println!("{}", generate::ignore_context(&recent));
            Ok(())
        }
        Command::Config(command) => handle_config_command(command),
    }
}

fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold: f64 = value.parse().map_err(|err| format!("{err}"))?;
    config::check_threshold(threshold).map_err(|err| err.to_string())
}

async fn handle_thread_command(command: ThreadCommand, config: &AppConfig) -> anyhow::Result<()> {
    let (comments, power_ups) = tokio::try_join!(
        read_json::<Vec<Comment>>(&command.comments),
        async {
            match &command.power_ups {
                Some(path) => read_json::<Vec<PowerUp>>(path).await.map(Some),
                None => Ok(None),
            }
        }
    )?;

    tracing::debug!(
        total = comments.len(),
        visible = thread::visible_comment_count(&comments),
        "loaded comments"
    );

    let mut comments = thread::without_deleted(comments);
    if let Some(power_ups) = power_ups {
        thread::attach_popularity(&mut comments, &power_ups);
    }

    let roots = thread::build_comment_tree(comments);

    if command.json {
        println!("{}", serde_json::to_string_pretty(&roots)?);
    } else {
        for line in render_thread(&roots, config.max_comment_depth, Utc::now()) {
            println!("{line}");
        }
    }

    Ok(())
}

async fn handle_filter_tips(command: FilterTipsCommand, config: &AppConfig) -> anyhow::Result<()> {
    let filter = command.filter;
    let (response, existing) = tokio::try_join!(
        read_text(&filter.response),
        read_json::<Vec<String>>(&filter.existing)
    )?;
    let existing_topics: Vec<String> = match &command.topics {
        Some(path) => read_json(path).await?,
        None => Vec::new(),
    };

    let tips = generate::parse_tips(&response)?;
    let threshold = filter.threshold.unwrap_or(config.dedup_threshold);
    let outcome = generate::filter_tips(tips, &existing, threshold, Utc::now().date_naive());

    let existing_names: HashSet<String> = existing_topics.iter().cloned().collect();
    let topics = generate::assign_topic_colors(
        outcome
            .accepted
            .iter()
            .filter_map(|post| post.primary_topic.as_deref()),
        &existing_names,
        existing_topics.len(),
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "posts": outcome.accepted,
            "topics": topics,
            "skipped": outcome.skipped.len(),
        }))?
    );
    Ok(())
}

async fn handle_filter_polls(command: FilterCommand, config: &AppConfig) -> anyhow::Result<()> {
    let (response, existing) = tokio::try_join!(
        read_text(&command.response),
        read_json::<Vec<String>>(&command.existing)
    )?;

    let polls = generate::parse_polls(&response)?;
    let threshold = command.threshold.unwrap_or(config.dedup_threshold);
    let outcome = generate::filter_polls(polls, &existing, threshold);

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "polls": outcome.accepted,
            "skipped": outcome.skipped.len(),
        }))?
    );
    Ok(())
}

fn handle_config_command(command: ConfigCommand) -> anyhow::Result<()> {
    let path = config::ensure_config_file()?;

    if command.path {
        println!("{}", path.display());
        return Ok(());
    }

    if command.edit {
        editor::edit_file_with_system_editor(path.as_path())?;
        return Ok(());
    }

    Ok(())
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = read_text(path).await?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON in {}", path.display()))
}
