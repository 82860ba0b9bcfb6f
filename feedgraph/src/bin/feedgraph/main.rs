mod commands;
mod output;
mod theme;

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, Style},
    },
};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};

use commands::{
    CommentCommands, CommentsArgs, FollowArgs, LikeCommands, PostCommands, Session, TimelineCommands, UserCommands,
    handle_comment, handle_comments, handle_follow, handle_like, handle_post, handle_timeline, handle_user,
};
use feedgraph::Settings;
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::THEME;

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis connection URL (default expansion of [redis] url)"),
    ("FEEDGRAPH_REDIS_URL", "Overrides the configured Redis URL"),
    ("FEEDGRAPH_PREFIX", "Key namespace inside Redis"),
    ("FEEDGRAPH_EMBED_LIMIT", "Comments embedded per timeline entry"),
    ("FEEDGRAPH_USER", "Default acting user for --as / --viewer"),
    ("RUST_LOG", "Log filter, e.g. feedgraph=debug"),
];

#[derive(Parser)]
#[command(name = "feedgraph")]
#[command(version)]
#[command(
    about = "Social feed and engagement engine over Redis",
    long_about = r#"Inspect and drive a feedgraph social graph stored in Redis:

• Timelines (global, per author, following) with ranked comments
• Like and follow toggles
• Post, comment and user management
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Path to a feedgraph.toml configuration file
    #[arg(long, short = 'c', env = "FEEDGRAPH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a timeline
    #[command(subcommand)]
    Timeline(TimelineCommands),

    /// List comments in like-ranked order
    Comments(CommentsArgs),

    /// Create, show or delete posts
    #[command(subcommand)]
    Post(PostCommands),

    /// Create or delete comments
    #[command(subcommand)]
    Comment(CommentCommands),

    /// Toggle a like on a post or comment
    #[command(subcommand)]
    Like(LikeCommands),

    /// Toggle following another user
    Follow(FollowArgs),

    /// Register and inspect users
    #[command(subcommand)]
    User(UserCommands),
}

fn build_cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    Cli::command()
        .styles(help_styles())
        .after_long_help(render_environment(use_color))
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never })
}

fn render_environment(use_color: bool) -> String {
    let mut buffer = String::new();
    let heading = stylize("Environment Variables:", THEME.highlight, true, use_color);
    let _ = writeln!(buffer, "{heading}");
    for (key, description) in ENVIRONMENT_VARIABLES {
        let key_text = stylize(key, THEME.key, true, use_color);
        let value_text = stylize(description, THEME.value, false, use_color);
        let _ = writeln!(buffer, "  {key_text}  {value_text}");
    }
    buffer
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }
    let styled = text.color(color);
    if bold { styled.bold().to_string() } else { styled.to_string() }
}

fn help_styles() -> Styles {
    Styles::styled()
        .usage(style_from_color(AnsiColor::BrightBlue).bold())
        .header(style_from_color(AnsiColor::Cyan).bold())
        .literal(style_from_color(AnsiColor::Magenta))
        .placeholder(style_from_color(AnsiColor::BrightBlack))
        .valid(style_from_color(AnsiColor::Green))
        .invalid(style_from_color(AnsiColor::Yellow))
        .error(style_from_color(AnsiColor::Red).bold())
}

fn style_from_color(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(ClapColor::Ansi(color)))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = build_cli_command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let options = GlobalOptions {
        output_format: cli.output.clone(),
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    if options.no_color {
        colored::control::set_override(false);
    }
    let output = OutputManager::new(options);

    if let Err(err) = execute(cli, &output).await {
        output.error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let session = Session::connect(&settings, output).await?;

    match cli.command {
        Commands::Timeline(command) => handle_timeline(&session, command, output).await,
        Commands::Comments(args) => handle_comments(&session, args, output).await,
        Commands::Post(command) => handle_post(&session, command, output).await,
        Commands::Comment(command) => handle_comment(&session, command, output).await,
        Commands::Like(command) => handle_like(&session, command, output).await,
        Commands::Follow(args) => handle_follow(&session, args, output).await,
        Commands::User(command) => handle_user(&session, command, output).await,
    }
}
