//! Durable repository keeping one directory per post under `<root>/posts`.
//!
//! Each post directory holds `meta.json` and `content.md`. The full set is
//! loaded into a [`PostTable`] on open; every write hits disk before the
//! in-memory table changes, so a failed write leaves the indices untouched.

mod meta;

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::application::pagination::PaginatedResult;
use crate::application::repos::{
    CountOptions, ExpectedVersion, ListOptions, PostRepository, RepoError,
};
use crate::domain::posts::Post;

use self::meta::{CONTENT_FILE, META_FILE, PostMeta};
use super::lock::{rw_read, rw_write};
use super::memory::conflict_kind;
use super::metrics::{record_conflict, record_delete, record_load_skipped, record_save};
use super::table::PostTable;

const SOURCE: &str = "infra::fs";
const BACKEND: &str = "file";
const POSTS_DIR: &str = "posts";

/// Outcome of scanning the posts directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct FilePostRepository {
    root: PathBuf,
    posts_dir: PathBuf,
    table: RwLock<PostTable>,
}

impl FilePostRepository {
    /// Open (creating if needed) the store rooted at `root` and load every
    /// readable post. Unreadable entries are skipped with a warning.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let root = root.into();
        let posts_dir = root.join(POSTS_DIR);
        fs::create_dir_all(&posts_dir).map_err(|err| {
            RepoError::from_persistence(format!(
                "failed to create `{}`: {err}",
                posts_dir.display()
            ))
        })?;

        let repo = Self {
            root,
            posts_dir,
            table: RwLock::new(PostTable::default()),
        };
        repo.reload()?;
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuild the in-memory table from disk, replacing the current one.
    ///
    /// The write lock is held across the scan so no save or delete can land
    /// between reading the directory and swapping the table.
    pub fn reload(&self) -> Result<LoadReport, RepoError> {
        let mut current = rw_write(&self.table, SOURCE, "reload");
        let (table, report) = load_table(&self.posts_dir)?;
        *current = table;
        drop(current);

        info!(
            target = SOURCE,
            op = "load",
            result = "ok",
            root = %self.root.display(),
            loaded = report.loaded,
            skipped = report.skipped,
            "Loaded post store"
        );
        Ok(report)
    }

    fn post_dir(&self, id: &str) -> PathBuf {
        self.posts_dir.join(id)
    }

    fn store(&self, post: &Post, expected: Option<ExpectedVersion>) -> Result<(), RepoError> {
        validate_id(post.id())?;
        let started_at = Instant::now();
        let mut table = rw_write(&self.table, SOURCE, "save");

        if let Err(err) = table.check_save(post, expected) {
            record_conflict(BACKEND, conflict_kind(&err));
            debug!(
                target = SOURCE,
                op = "save",
                result = "rejected",
                post_id = post.id(),
                error = %err,
                "Rejected post write"
            );
            return Err(err);
        }

        if let Err(err) = write_post(&self.post_dir(post.id()), post) {
            warn!(
                target = SOURCE,
                op = "save",
                result = "io_error",
                post_id = post.id(),
                error = %err,
                "Failed to persist post"
            );
            return Err(RepoError::from_persistence(format!(
                "failed to write post `{}`: {err}",
                post.id()
            )));
        }

        table.upsert(post.clone());
        record_save(BACKEND, started_at);
        info!(
            target = SOURCE,
            op = "save",
            result = "ok",
            post_id = post.id(),
            slug = post.slug().as_str(),
            version = post.version(),
            "Persisted post"
        );
        Ok(())
    }
}

impl PostRepository for FilePostRepository {
    fn find_by_id(&self, id: &str) -> Result<Post, RepoError> {
        rw_read(&self.table, SOURCE, "find_by_id")
            .get(id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn find_by_slug(&self, slug: &str) -> Result<Post, RepoError> {
        rw_read(&self.table, SOURCE, "find_by_slug")
            .get_by_slug(slug)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn find_all(&self, options: &ListOptions) -> Result<PaginatedResult<Post>, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "find_all").list(options))
    }

    fn find_by_tag(&self, tag: &str) -> Result<Vec<Post>, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "find_by_tag").by_tag(tag))
    }

    fn find_all_tags(&self) -> Result<Vec<String>, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "find_all_tags").tag_names())
    }

    fn save(&self, post: &Post) -> Result<(), RepoError> {
        self.store(post, None)
    }

    fn save_expecting(&self, post: &Post, expected: ExpectedVersion) -> Result<(), RepoError> {
        self.store(post, Some(expected))
    }

    fn delete(&self, id: &str) -> Result<(), RepoError> {
        let mut table = rw_write(&self.table, SOURCE, "delete");
        if table.get(id).is_none() {
            return Err(RepoError::NotFound);
        }

        match fs::remove_dir_all(self.post_dir(id)) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "delete",
                    result = "io_error",
                    post_id = id,
                    error = %err,
                    "Failed to remove post directory"
                );
                return Err(RepoError::from_persistence(format!(
                    "failed to delete post `{id}`: {err}"
                )));
            }
        }

        table.remove(id);
        record_delete(BACKEND);
        info!(
            target = SOURCE,
            op = "delete",
            result = "ok",
            post_id = id,
            "Deleted post"
        );
        Ok(())
    }

    fn exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "exists")
            .slug_owner(slug)
            .is_some())
    }

    fn count(&self, options: &CountOptions) -> Result<usize, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "count").count(options))
    }
}

/// Post ids name directories, so they must be exactly one normal path component.
fn validate_id(id: &str) -> Result<(), RepoError> {
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name.to_str() == Some(id) => Ok(()),
        _ => Err(RepoError::invalid_input(format!(
            "post id `{id}` must be a single path component"
        ))),
    }
}

fn load_table(posts_dir: &Path) -> Result<(PostTable, LoadReport), RepoError> {
    let entries = fs::read_dir(posts_dir).map_err(|err| {
        RepoError::from_persistence(format!("failed to read `{}`: {err}", posts_dir.display()))
    })?;

    let mut table = PostTable::default();
    let mut report = LoadReport::default();

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                skip_entry(&mut report, posts_dir, &err.to_string());
                continue;
            }
        };
        if !entry.path().is_dir() {
            continue;
        }
        dirs.push(entry.path());
    }
    // First directory by name wins a duplicated slug.
    dirs.sort();

    for dir in dirs {
        let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
            skip_entry(&mut report, &dir, "directory name is not valid UTF-8");
            continue;
        };

        let post = match read_post(&dir, name) {
            Ok(post) => post,
            Err(reason) => {
                skip_entry(&mut report, &dir, &reason);
                continue;
            }
        };

        if let Some(owner) = table.slug_owner(post.slug().as_str()) {
            let reason = format!("slug `{}` already loaded for post `{owner}`", post.slug());
            skip_entry(&mut report, &dir, &reason);
            continue;
        }

        table.upsert(post);
        report.loaded += 1;
    }

    Ok((table, report))
}

fn read_post(dir: &Path, name: &str) -> Result<Post, String> {
    let raw = fs::read(dir.join(META_FILE)).map_err(|err| format!("cannot read {META_FILE}: {err}"))?;
    let meta: PostMeta =
        serde_json::from_slice(&raw).map_err(|err| format!("malformed {META_FILE}: {err}"))?;
    if meta.id != name {
        return Err(format!(
            "metadata id `{}` does not match directory `{name}`",
            meta.id
        ));
    }

    let content = fs::read_to_string(dir.join(CONTENT_FILE))
        .map_err(|err| format!("cannot read {CONTENT_FILE}: {err}"))?;
    meta.into_post(content)
}

fn skip_entry(report: &mut LoadReport, path: &Path, reason: &str) {
    report.skipped += 1;
    record_load_skipped();
    warn!(
        target = SOURCE,
        op = "load",
        result = "skipped",
        path = %path.display(),
        reason,
        "Skipping unreadable post entry"
    );
}

/// Both files are fully written and synced as temp files before either is
/// renamed into place, content first and metadata last. A post only becomes
/// loadable once its `meta.json` is in place.
///
/// The two renames are still separate steps: a failure of the second leaves
/// new content beside old metadata until the next save of that post.
fn write_post(dir: &Path, post: &Post) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let meta = serde_json::to_vec_pretty(&PostMeta::from(post)).map_err(io::Error::other)?;
    let content = stage(dir, post.content().as_bytes())?;
    let meta = stage(dir, &meta)?;

    content
        .persist(dir.join(CONTENT_FILE))
        .map_err(|err| err.error)?;
    meta.persist(dir.join(META_FILE)).map_err(|err| err.error)?;
    Ok(())
}

fn stage(dir: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}
