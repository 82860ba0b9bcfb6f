use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;

use feedgraph::{Comment, FeedEntry, Page, Post, RankedComments, ToggleAck, UserProfile, UserSummary};

use crate::theme::{ICONS, THEME};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Data that can be rendered as a table or a single line
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    pub fn success(&self, message: &str) {
        if self.options.quiet || self.is_json() {
            return;
        }
        let output = if self.options.no_color {
            format!("{} {message}", ICONS.success)
        } else {
            format!("{} {}", ICONS.success.color(THEME.success), message.color(THEME.success))
        };
        println!("{output}");
    }

    pub fn error(&self, message: &str) {
        let output = if self.options.no_color {
            format!("{} {message}", ICONS.error)
        } else {
            format!("{} {}", ICONS.error.color(THEME.error), message.color(THEME.error))
        };
        eprintln!("{output}");
    }

    pub fn warning(&self, message: &str) {
        if self.options.quiet {
            return;
        }
        let output = if self.options.no_color {
            format!("{} {message}", ICONS.warning)
        } else {
            format!("{} {}", ICONS.warning.color(THEME.warning), message.color(THEME.warning))
        };
        eprintln!("{output}");
    }

    /// Display verbose information (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            let output = if self.options.no_color {
                format!("{} {message}", ICONS.arrow)
            } else {
                format!("{} {}", ICONS.arrow.color(THEME.muted), message.color(THEME.muted))
            };
            eprintln!("{output}");
        }
    }

    pub fn info(&self, message: &str) {
        if self.options.quiet || self.is_json() {
            return;
        }
        let output = if self.options.no_color {
            format!("{} {message}", ICONS.info)
        } else {
            format!("{} {}", ICONS.info.color(THEME.info), message.color(THEME.info))
        };
        println!("{output}");
    }

    pub fn heading(&self, text: &str) {
        if self.options.quiet || self.is_json() {
            return;
        }
        let output = if self.options.no_color {
            format!("\n{text}\n{}", "=".repeat(text.len()))
        } else {
            format!("\n{}", text.color(THEME.primary).bold())
        };
        println!("{output}");
    }

    fn is_json(&self) -> bool {
        matches!(self.options.output_format, OutputFormat::Json)
    }
}

fn create_table(options: &GlobalOptions) -> Table {
    let mut table = Table::new();
    if options.no_color {
        table.load_preset(comfy_table::presets::ASCII_FULL);
    } else {
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    }
    table
}

fn add_table_header(options: &GlobalOptions, table: &mut Table, headers: &[&str]) {
    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|header| {
            let cell = Cell::new(header).add_attribute(Attribute::Bold);
            if options.no_color { cell } else { cell.fg(TableColor::Cyan) }
        })
        .collect();
    table.set_header(header_cells);
}

fn key_value_table(options: &GlobalOptions, rows: Vec<(&str, String)>) -> Table {
    let mut table = create_table(options);
    add_table_header(options, &mut table, &["Field", "Value"]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    table
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn page_footer<T>(table: &mut Table, page: &Page<T>) {
    table.add_row(vec![Cell::new(format!(
        "page {} · {} of {} shown{}",
        page.page,
        page.items.len(),
        page.count,
        if page.has_more { " · more available" } else { "" }
    ))
    .add_attribute(Attribute::Dim)]);
}

impl TableDisplay for Page<FeedEntry> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = create_table(options);
        add_table_header(options, &mut table, &["Post", "Title", "Author", "Created", ICONS.heart, ICONS.speech, "Top comment"]);
        for entry in &self.items {
            let top = entry
                .comments
                .first()
                .map(|comment| format!("{} ({})", truncate(&comment.message, 32), comment.like_count()))
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(&entry.post.id),
                Cell::new(truncate(&entry.post.title, 40)),
                Cell::new(&entry.post.author.username),
                Cell::new(entry.post.created_at.format("%Y-%m-%d %H:%M").to_string()),
                Cell::new(entry.like_count),
                Cell::new(entry.comment_count),
                Cell::new(top),
            ]);
        }
        page_footer(&mut table, self);
        table
    }

    fn to_compact(&self) -> String {
        let ids: Vec<&str> = self.items.iter().map(|entry| entry.post.id.as_str()).collect();
        format!("posts={}/{} [{}]", self.items.len(), self.count, ids.join(","))
    }
}

fn comment_rows(options: &GlobalOptions, comments: &[Comment]) -> Table {
    let mut table = create_table(options);
    add_table_header(options, &mut table, &["Comment", "Post", "Author", ICONS.heart, "Message"]);
    for comment in comments {
        table.add_row(vec![
            Cell::new(&comment.id),
            Cell::new(&comment.post),
            Cell::new(&comment.author.username),
            Cell::new(comment.like_count()),
            Cell::new(truncate(&comment.message, 60)),
        ]);
    }
    table
}

impl TableDisplay for Page<Comment> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = comment_rows(options, &self.items);
        page_footer(&mut table, self);
        table
    }

    fn to_compact(&self) -> String {
        format!("comments={}/{}", self.items.len(), self.count)
    }
}

impl TableDisplay for RankedComments {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        comment_rows(options, &self.comments)
    }

    fn to_compact(&self) -> String {
        format!("comments={}/{}", self.comments.len(), self.count)
    }
}

impl TableDisplay for Page<UserSummary> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = create_table(options);
        add_table_header(options, &mut table, &["User", "Username"]);
        for user in &self.items {
            table.add_row(vec![Cell::new(&user.id), Cell::new(&user.username)]);
        }
        page_footer(&mut table, self);
        table
    }

    fn to_compact(&self) -> String {
        let names: Vec<&str> = self.items.iter().map(|user| user.username.as_str()).collect();
        format!("users={}/{} [{}]", self.items.len(), self.count, names.join(","))
    }
}

impl TableDisplay for FeedEntry {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = key_value_table(
            options,
            vec![
                ("id", self.post.id.clone()),
                ("title", self.post.title.clone()),
                ("description", self.post.description.clone()),
                ("author", self.post.author.username.clone()),
                ("created", self.post.created_at.to_rfc3339()),
                ("likes", self.like_count.to_string()),
                ("comments", self.comment_count.to_string()),
            ],
        );
        for comment in &self.comments {
            table.add_row(vec![
                Cell::new(format!("{} {}", ICONS.bullet, comment.author.username)),
                Cell::new(format!("{} ({} {})", comment.message, comment.like_count(), ICONS.heart)),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "{} likes={} comments={}",
            self.post.id, self.like_count, self.comment_count
        )
    }
}

impl TableDisplay for Post {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        key_value_table(
            options,
            vec![
                ("id", self.id.clone()),
                ("title", self.title.clone()),
                ("description", self.description.clone()),
                ("author", self.author.username.clone()),
                ("updated", self.updated_at.to_rfc3339()),
            ],
        )
    }

    fn to_compact(&self) -> String {
        self.id.clone()
    }
}

impl TableDisplay for Comment {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        comment_rows(options, std::slice::from_ref(self))
    }

    fn to_compact(&self) -> String {
        self.id.clone()
    }
}

impl TableDisplay for UserProfile {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        key_value_table(
            options,
            vec![
                ("id", self.id.clone()),
                ("username", self.username.clone()),
                ("email", self.email.clone()),
                ("posts", self.posts.len().to_string()),
                ("following", self.following.len().to_string()),
                ("followers", self.followers.len().to_string()),
                ("joined", self.created_at.to_rfc3339()),
            ],
        )
    }

    fn to_compact(&self) -> String {
        format!("{} {}", self.id, self.username)
    }
}

impl TableDisplay for ToggleAck {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut rows = vec![("message", self.message.clone())];
        if let Some(following) = self.is_following {
            rows.push(("following", following.to_string()));
        }
        key_value_table(options, rows)
    }

    fn to_compact(&self) -> String {
        self.message.clone()
    }
}
