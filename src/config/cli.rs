use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::application::index::YearMonth;
use crate::domain::types::PostStatus;

/// Command-line arguments for the Ventus binary.
#[derive(Debug, Parser)]
#[command(name = "ventus", version, about = "File-backed post store")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "VENTUS_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the content store root directory.
    #[arg(
        long = "content-path",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub content_path: Option<PathBuf>,

    /// Override the excerpt length in bytes.
    #[arg(long = "excerpt-length", value_name = "BYTES", global = true)]
    pub excerpt_length: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Create a draft post.
    Create(CreateArgs),
    /// Print a single post.
    Show(ShowArgs),
    /// Change a post, guarded by its current version.
    Update(UpdateArgs),
    /// Publish a draft.
    Publish(VersionedArgs),
    /// Move a published post back to draft.
    Unpublish(VersionedArgs),
    /// Delete a post and its files.
    Delete(DeleteArgs),
    /// List posts, newest first by default.
    List(ListArgs),
    /// List tags.
    Tags(TagsArgs),
    /// Browse posts by creation month.
    Archive(ArchiveArgs),
    /// Count posts by status.
    Stats,
}

#[derive(Debug, Args, Clone)]
#[command(group(ArgGroup::new("body").required(true).args(["content", "content_file"])))]
pub struct CreateArgs {
    /// Post title; also the source of the slug.
    #[arg(long)]
    pub title: String,

    /// Inline markdown body.
    #[arg(long)]
    pub content: Option<String>,

    /// Read the markdown body from a file.
    #[arg(long = "content-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    /// Comma-separated tag list.
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,

    /// Cover image reference.
    #[arg(long, value_name = "URL")]
    pub cover: Option<String>,
}

#[derive(Debug, Args, Clone)]
#[command(group(ArgGroup::new("target").required(true).args(["id", "slug"])))]
pub struct ShowArgs {
    /// Post id.
    pub id: Option<String>,

    /// Look the post up by slug instead of id.
    #[arg(long)]
    pub slug: Option<String>,
}

#[derive(Debug, Args, Clone)]
#[command(group(ArgGroup::new("body").args(["content", "content_file"])))]
pub struct UpdateArgs {
    /// Post id.
    pub id: String,

    /// Version the change was prepared against.
    #[arg(long = "expected-version", value_name = "VERSION")]
    pub expected_version: u64,

    /// New title; a changed title re-derives the slug.
    #[arg(long)]
    pub title: Option<String>,

    /// New inline markdown body.
    #[arg(long)]
    pub content: Option<String>,

    /// Read the new markdown body from a file.
    #[arg(long = "content-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    /// Replacement comma-separated tag list; an empty value clears all tags.
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,

    /// Target status (draft|published).
    #[arg(long, value_name = "STATUS")]
    pub status: Option<PostStatus>,

    /// Cover image reference; an empty value clears it.
    #[arg(long, value_name = "URL")]
    pub cover: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct VersionedArgs {
    /// Post id.
    pub id: String,

    /// Version the change was prepared against.
    #[arg(long = "expected-version", value_name = "VERSION")]
    pub expected_version: u64,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    /// Post id.
    pub id: String,
}

#[derive(Debug, Args, Clone, Default)]
pub struct ListArgs {
    /// Only posts carrying this tag.
    #[arg(long)]
    pub tag: Option<String>,

    /// Only posts in this status (draft|published).
    #[arg(long, value_name = "STATUS")]
    pub status: Option<PostStatus>,

    /// Creation-date ordering.
    #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
    pub order: SortOrder,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Page size; defaults to `content.default_page_size`.
    #[arg(long = "page-size", value_name = "COUNT")]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

#[derive(Debug, Args, Clone, Default)]
pub struct TagsArgs {
    /// Include the number of posts per tag.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub counts: bool,
}

#[derive(Debug, Args, Clone, Default)]
pub struct ArchiveArgs {
    /// First month of the range (YYYY-MM), inclusive.
    #[arg(long, value_name = "YYYY-MM", requires = "to")]
    pub from: Option<YearMonth>,

    /// Last month of the range (YYYY-MM), inclusive.
    #[arg(long, value_name = "YYYY-MM", requires = "from")]
    pub to: Option<YearMonth>,
}
