use std::{collections::BTreeMap, fs, path::Path, process, sync::Arc};

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use ventus::{
    application::{
        error::AppError,
        index::{IndexService, YearMonth},
        pagination::PaginatedResult,
        posts::{CreatePostCommand, PostService, UpdatePostCommand},
        repos::{ListOptions, PostOrder, PostRepository},
        slugs::SlugService,
    },
    config,
    domain::{posts::Post, types::PostStatus},
    infra::{fs::FilePostRepository, telemetry},
};

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, kind = error.kind(), "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, kind = error.kind(), "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    let store = Arc::new(FilePostRepository::open(&settings.storage.content_path)?);
    info!(
        target = "ventus::main",
        root = %store.root().display(),
        "Opened content store"
    );
    let app = AppContext::new(store, &settings);

    match cli_args.command {
        config::Command::Create(args) => run_create(&app, args),
        config::Command::Show(args) => run_show(&app, args),
        config::Command::Update(args) => run_update(&app, args),
        config::Command::Publish(args) => {
            print_json(&app.posts.publish_post(&args.id, args.expected_version)?)
        }
        config::Command::Unpublish(args) => {
            print_json(&app.posts.unpublish_post(&args.id, args.expected_version)?)
        }
        config::Command::Delete(args) => {
            app.posts.delete_post(&args.id)?;
            print_json(&serde_json::json!({ "deleted": args.id }))
        }
        config::Command::List(args) => run_list(&app, args),
        config::Command::Tags(args) => run_tags(&app, args),
        config::Command::Archive(args) => run_archive(&app, args),
        config::Command::Stats => print_json(&app.posts.stats()?),
    }
}

/// The single store instance and the services sharing it.
struct AppContext {
    posts: PostService,
    index: IndexService,
    default_page_size: usize,
}

impl AppContext {
    fn new(store: Arc<FilePostRepository>, settings: &config::Settings) -> Self {
        let repo: Arc<dyn PostRepository> = store;
        let slugs = SlugService::new(repo.clone());
        let posts = PostService::new(repo.clone(), slugs)
            .with_excerpt_length(settings.content.excerpt_length.get());
        let index = IndexService::new(repo);

        Self {
            posts,
            index,
            default_page_size: settings.content.default_page_size.get(),
        }
    }
}

fn run_create(app: &AppContext, args: config::CreateArgs) -> Result<(), AppError> {
    let content = read_body(args.content, args.content_file.as_deref())?
        .ok_or_else(|| AppError::validation("create requires --content or --content-file"))?;

    let post = app.posts.create_post(CreatePostCommand {
        title: args.title,
        content,
        tags: args.tags.as_deref().map(split_tags).unwrap_or_default(),
        cover: args.cover,
    })?;
    print_json(&post)
}

fn run_show(app: &AppContext, args: config::ShowArgs) -> Result<(), AppError> {
    let post = match (args.id, args.slug) {
        (Some(id), _) => app.posts.get_post(&id)?,
        (None, Some(slug)) => app.posts.get_post_by_slug(&slug)?,
        (None, None) => return Err(AppError::validation("show requires an id or --slug")),
    };
    print_json(&post)
}

fn run_update(app: &AppContext, args: config::UpdateArgs) -> Result<(), AppError> {
    let command = UpdatePostCommand {
        title: args.title,
        content: read_body(args.content, args.content_file.as_deref())?,
        tags: args.tags.as_deref().map(split_tags),
        status: args.status,
        cover: args.cover,
    };
    print_json(&app.posts.update_post(&args.id, command, args.expected_version)?)
}

fn run_list(app: &AppContext, args: config::ListArgs) -> Result<(), AppError> {
    let options = ListOptions {
        tag: args.tag,
        status: args.status,
        order: match args.order {
            config::SortOrder::Desc => PostOrder::DateDesc,
            config::SortOrder::Asc => PostOrder::DateAsc,
        },
        page: args.page,
        page_size: args.page_size.unwrap_or(app.default_page_size),
    };

    let page = app.posts.list_posts(&options)?;
    let summaries = PaginatedResult {
        items: page.items.iter().map(PostSummary::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    };
    print_json(&summaries)
}

fn run_tags(app: &AppContext, args: config::TagsArgs) -> Result<(), AppError> {
    if !args.counts {
        return print_json(&app.posts.all_tags()?);
    }

    let index = app.index.build_index()?;
    let counts: BTreeMap<String, usize> = index
        .all_tags()
        .into_iter()
        .map(|tag| {
            let count = index.tag_count(&tag);
            (tag, count)
        })
        .collect();
    print_json(&counts)
}

fn run_archive(app: &AppContext, args: config::ArchiveArgs) -> Result<(), AppError> {
    let index = app.index.build_index()?;

    if let (Some(from), Some(to)) = (args.from, args.to) {
        return print_json(&index.search_by_date_range(from, to));
    }

    let months: Vec<ArchiveMonth> = index
        .archive_months()
        .into_iter()
        .map(|month| ArchiveMonth {
            month,
            count: index.month_count(month),
        })
        .collect();
    print_json(&months)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostSummary<'a> {
    id: &'a str,
    title: &'a str,
    slug: &'a str,
    status: PostStatus,
    tags: Vec<String>,
    excerpt: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    version: u64,
}

impl<'a> From<&'a Post> for PostSummary<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            id: post.id(),
            title: post.title(),
            slug: post.slug().as_str(),
            status: post.status(),
            tags: post.tag_names(),
            excerpt: post.excerpt(),
            created_at: post.created_at(),
            version: post.version(),
        }
    }
}

#[derive(Serialize)]
struct ArchiveMonth {
    month: YearMonth,
    count: usize,
}

fn read_body(inline: Option<String>, file: Option<&Path>) -> Result<Option<String>, AppError> {
    match (inline, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => fs::read_to_string(path).map(Some).map_err(|err| {
            AppError::validation(format!("failed to read `{}`: {err}", path.display()))
        }),
        (None, None) => Ok(None),
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(|tag| tag.trim().to_string()).collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tags_trims_and_keeps_empty_entries_for_the_service() {
        assert_eq!(split_tags("rust, go ,,web"), vec!["rust", "go", "", "web"]);
        assert_eq!(split_tags(""), vec![""]);
    }

    #[test]
    fn inline_body_wins_over_file() {
        let body = read_body(Some("inline".to_string()), Some(Path::new("/nonexistent")))
            .expect("inline body");
        assert_eq!(body.as_deref(), Some("inline"));
        assert!(read_body(None, None).expect("no body").is_none());
        assert!(read_body(None, Some(Path::new("/nonexistent/body.md"))).is_err());
    }
}
