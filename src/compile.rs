//! Compilation orchestration.
//!
//! One invocation performs a full rebuild, strictly sequentially:
//!
//! ```text
//! compile()
//!     │
//!     ├── clear_output()     wipe everything under the output root
//!     │
//!     ├── walk content tree  mirror directories, then per file:
//!     │       extract front-matter ──► sync store record ──►
//!     │       convert to fragment ──► wrap in layout ──► write .html (0444)
//!     │
//!     └── sync_static()      copy the static dir, or write the default
//!                            stylesheet when none is supplied
//! ```
//!
//! The first error of any kind aborts the run; output already written and
//! metadata already committed stay in place (this is a batch tool, there is
//! no rollback).

use crate::{
    convert::Converter,
    layout::Layout,
    log,
    meta::{self, Metadata},
    store::{MetadataStore, StoreError},
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::ErrorKind,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Mode bits for published artifacts. Output must not be casually edited
/// after a compile; the next run rewrites the whole tree anyway.
const ARTIFACT_MODE: u32 = 0o444;

/// Static assets land in this directory under the output root.
const STATIC_DIR: &str = "static";

/// Stylesheet written when no static directory is supplied.
const DEFAULT_STYLES: &str = include_str!("embed/styles.css");

/// The compilation orchestrator.
///
/// Collaborators arrive by injection: the store, the conversion engine and
/// the layout are handles, never ambient globals.
pub struct Compiler<'a> {
    store: &'a dyn MetadataStore,
    converter: &'a dyn Converter,
    layout: &'a Layout,
    site_name: &'a str,
}

impl<'a> Compiler<'a> {
    pub fn new(
        store: &'a dyn MetadataStore,
        converter: &'a dyn Converter,
        layout: &'a Layout,
        site_name: &'a str,
    ) -> Self {
        Self {
            store,
            converter,
            layout,
            site_name,
        }
    }

    /// Run a full compilation of `content_dir` into `output_dir`.
    ///
    /// The output tree is rebuilt from empty on every run; no incremental
    /// diffing, so stale files never survive.
    pub fn compile(
        &self,
        content_dir: &Path,
        output_dir: &Path,
        static_dir: Option<&Path>,
    ) -> Result<()> {
        clear_output(output_dir)?;
        fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create output root `{}`", output_dir.display()))?;

        self.walk_content(content_dir, output_dir)?;
        self.sync_static(static_dir, output_dir)?;

        log!("build"; "done");
        Ok(())
    }

    fn walk_content(&self, content_dir: &Path, output_dir: &Path) -> Result<()> {
        for entry in WalkDir::new(content_dir).sort_by_file_name() {
            let entry = entry?;
            let rel = entry.path().strip_prefix(content_dir)?;
            if rel.as_os_str().is_empty() {
                continue;
            }
            if entry.file_type().is_dir() {
                mirror_dir(&entry, &output_dir.join(rel))?;
            } else {
                self.process_file(entry.path(), rel, output_dir)
                    .with_context(|| format!("failed to compile `{}`", entry.path().display()))?;
            }
        }
        Ok(())
    }

    /// The per-file pipeline: extract, sync record, convert, render, write.
    ///
    /// Every run re-processes every file. A freshness short-circuit (mtime
    /// or content hash against the store) would slot in at the top of this
    /// function without changing its signature.
    fn process_file(&self, source: &Path, rel: &Path, output_dir: &Path) -> Result<()> {
        let filepath = rel
            .to_str()
            .ok_or_else(|| anyhow!("path is not valid UTF-8: {}", rel.display()))?;

        let md = meta::extract_from_file(source, filepath)?;
        self.sync_record(md)?;

        let fragment = self.converter.to_html(source)?;
        let doc = self.layout.render(&fragment, self.site_name);

        let dest = output_dir.join(html_path(rel));
        write_artifact(&dest, doc.as_bytes())?;
        log!("compile"; "{}", rel.display());
        Ok(())
    }

    /// Create or update the metadata record keyed by filepath.
    fn sync_record(&self, mut md: Metadata) -> Result<(), StoreError> {
        if self.store.metadata_exists(&md.filepath)? {
            // The id never changes across updates; re-read it so new tag
            // rows link to the existing record.
            md.id = self.store.read_metadata(&md.filepath)?.id;
            self.process_tags(&md)?;
            self.store.update_metadata(&md)?;
        } else {
            md.id = self.store.create_metadata(&md)?;
            self.process_tags(&md)?;
        }
        Ok(())
    }

    /// Tag rows are keyed store-wide by name: a name that already exists
    /// under any record is skipped, not re-linked (see DESIGN.md).
    fn process_tags(&self, md: &Metadata) -> Result<(), StoreError> {
        for tag in &md.tags {
            if self.store.tag_exists(tag)? {
                continue;
            }
            self.store.create_tag(md.id, tag)?;
        }
        Ok(())
    }

    /// Sync static assets into `<output>/static/`.
    fn sync_static(&self, static_dir: Option<&Path>, output_dir: &Path) -> Result<()> {
        let dest_root = output_dir.join(STATIC_DIR);

        let Some(src) = static_dir.filter(|d| d.exists()) else {
            fs::create_dir_all(&dest_root)?;
            write_artifact(&dest_root.join("styles.css"), DEFAULT_STYLES.as_bytes())?;
            log!("static"; "wrote default stylesheet");
            return Ok(());
        };

        for entry in WalkDir::new(src).sort_by_file_name() {
            let entry = entry?;
            let rel = entry.path().strip_prefix(src)?;
            let dest = dest_root.join(rel);
            if entry.file_type().is_dir() {
                mirror_dir(&entry, &dest)?;
            } else {
                let content = fs::read(entry.path())
                    .with_context(|| format!("failed to read `{}`", entry.path().display()))?;
                write_artifact(&dest, &content)?;
            }
        }
        log!("static"; "copied {}", src.display());
        Ok(())
    }
}

// ============================================================================
// Filesystem Helpers
// ============================================================================

/// Remove every entry under the output root. A missing root is not an
/// error; the root itself is kept (recreated by the caller if needed).
fn clear_output(output_dir: &Path) -> Result<()> {
    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read output root `{}`", output_dir.display()));
        }
    };
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Create a mirrored directory, preserving the source's mode bits.
fn mirror_dir(entry: &walkdir::DirEntry, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    fs::set_permissions(dest, entry.metadata()?.permissions())
        .with_context(|| format!("failed to set permissions on `{}`", dest.display()))?;
    Ok(())
}

/// Write published bytes, then drop write permission.
fn write_artifact(dest: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(dest, bytes).with_context(|| format!("failed to write `{}`", dest.display()))?;
    fs::set_permissions(dest, fs::Permissions::from_mode(ARTIFACT_MODE))
        .with_context(|| format!("failed to set permissions on `{}`", dest.display()))?;
    Ok(())
}

/// Replace the source extension with `.html` (`posts/a.md` → `posts/a.html`).
pub fn html_path(path: &Path) -> PathBuf {
    path.with_extension("html")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConvertError;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    /// Stand-in conversion engine: wraps the raw file content.
    struct EchoConverter;

    impl Converter for EchoConverter {
        fn to_html(&self, source: &Path) -> Result<String, ConvertError> {
            let body = fs::read_to_string(source).unwrap_or_default();
            Ok(format!("<pre>{body}</pre>"))
        }
    }

    fn front_matter(title: &str, created: &str, tags: &str) -> String {
        format!(
            "---\ntitle: {title}\nauthor: tester\ncreated: {created}\nlast_updated: {created}\ntags: [{tags}]\nhome: false\n---\nbody of {title}\n"
        )
    }

    fn write_content(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn mode_of(path: &Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    fn site(root: &TempDir) -> (PathBuf, PathBuf) {
        let content = root.path().join("content");
        let output = root.path().join("served_content");
        fs::create_dir_all(&content).unwrap();
        (content, output)
    }

    #[test]
    fn test_compile_mirrors_tree() {
        let root = tempfile::tempdir().unwrap();
        let (content, output) = site(&root);
        write_content(&content, "index.md", &front_matter("Home", "2024-01-01", ""));
        write_content(&content, "posts/a.md", &front_matter("A", "2024-01-02", "go"));

        let store = SqliteStore::in_memory();
        let converter = EchoConverter;
        let layout = Layout::default();
        let compiler = Compiler::new(&store, &converter, &layout, "foo bar");
        compiler.compile(&content, &output, None).unwrap();

        assert!(output.join("index.html").is_file());
        assert!(output.join("posts").is_dir());
        assert!(output.join("posts/a.html").is_file());
        assert!(output.join("static/styles.css").is_file());

        assert_eq!(mode_of(&output.join("index.html")), ARTIFACT_MODE);
        assert_eq!(mode_of(&output.join("posts/a.html")), ARTIFACT_MODE);
        assert_eq!(mode_of(&output.join("static/styles.css")), ARTIFACT_MODE);

        let a = store.read_metadata("posts/a.md").unwrap();
        assert_eq!(a.title, "A");
        assert_eq!(a.tags, vec!["go"]);

        let doc = fs::read_to_string(output.join("posts/a.html")).unwrap();
        assert!(doc.contains("body of A"));
        assert!(doc.contains("foo bar"));
    }

    #[test]
    fn test_recompile_preserves_id_and_updates_record() {
        let root = tempfile::tempdir().unwrap();
        let (content, output) = site(&root);
        write_content(&content, "index.md", &front_matter("Home", "2024-01-01", ""));

        let store = SqliteStore::in_memory();
        let converter = EchoConverter;
        let layout = Layout::default();
        let compiler = Compiler::new(&store, &converter, &layout, "site");

        compiler.compile(&content, &output, None).unwrap();
        let first = store.read_metadata("index.md").unwrap();

        write_content(&content, "index.md", &front_matter("Renamed", "2024-01-01", ""));
        compiler.compile(&content, &output, None).unwrap();

        let second = store.read_metadata("index.md").unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.title, "Renamed");
        assert_eq!(store.read_all_metadata().unwrap().len(), 1);
    }

    #[test]
    fn test_reruns_are_byte_identical() {
        let root = tempfile::tempdir().unwrap();
        let (content, output) = site(&root);
        write_content(&content, "index.md", &front_matter("Home", "2024-01-01", ""));
        write_content(&content, "posts/a.md", &front_matter("A", "2024-01-02", "go"));

        let store = SqliteStore::in_memory();
        let converter = EchoConverter;
        let layout = Layout::default();
        let compiler = Compiler::new(&store, &converter, &layout, "site");

        compiler.compile(&content, &output, None).unwrap();
        let first = fs::read(output.join("posts/a.html")).unwrap();

        compiler.compile(&content, &output, None).unwrap();
        let second = fs::read(output.join("posts/a.html")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_rebuilt_from_empty() {
        let root = tempfile::tempdir().unwrap();
        let (content, output) = site(&root);
        write_content(&content, "index.md", &front_matter("Home", "2024-01-01", ""));

        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("stale.html"), "left over").unwrap();
        fs::create_dir_all(output.join("gone")).unwrap();

        let store = SqliteStore::in_memory();
        let converter = EchoConverter;
        let layout = Layout::default();
        Compiler::new(&store, &converter, &layout, "site")
            .compile(&content, &output, None)
            .unwrap();

        assert!(!output.join("stale.html").exists());
        assert!(!output.join("gone").exists());
        assert!(output.join("index.html").is_file());
    }

    #[test]
    fn test_abort_keeps_earlier_output() {
        let root = tempfile::tempdir().unwrap();
        let (content, output) = site(&root);
        write_content(&content, "a.md", &front_matter("A", "2024-01-01", ""));
        write_content(&content, "z.md", "no front-matter here\n");

        let store = SqliteStore::in_memory();
        let converter = EchoConverter;
        let layout = Layout::default();
        let err = Compiler::new(&store, &converter, &layout, "site")
            .compile(&content, &output, None)
            .unwrap_err();

        assert!(format!("{err:#}").contains("no front-matter found"));
        // Files walked before the bad one stay written; nothing is rolled back.
        assert!(output.join("a.html").is_file());
        assert!(store.metadata_exists("a.md").unwrap());
        assert!(!output.join("z.html").exists());
    }

    #[test]
    fn test_shared_tag_not_relinked() {
        let root = tempfile::tempdir().unwrap();
        let (content, output) = site(&root);
        write_content(&content, "a.md", &front_matter("A", "2024-01-01", "go"));
        write_content(&content, "b.md", &front_matter("B", "2024-01-02", "go"));

        let store = SqliteStore::in_memory();
        let converter = EchoConverter;
        let layout = Layout::default();
        Compiler::new(&store, &converter, &layout, "site")
            .compile(&content, &output, None)
            .unwrap();

        let a = store.read_metadata("a.md").unwrap();
        let b = store.read_metadata("b.md").unwrap();
        // One row total: the name already existed when b.md was processed,
        // so its link was skipped entirely.
        assert_eq!(store.read_tags(a.id).unwrap(), vec!["go"]);
        assert!(store.read_tags(b.id).unwrap().is_empty());
    }

    #[test]
    fn test_static_dir_copied_read_only() {
        let root = tempfile::tempdir().unwrap();
        let (content, output) = site(&root);
        write_content(&content, "index.md", &front_matter("Home", "2024-01-01", ""));

        let static_src = root.path().join("assets");
        write_content(&static_src, "styles/main.css", "body {}");
        write_content(&static_src, "logo.svg", "<svg/>");

        let store = SqliteStore::in_memory();
        let converter = EchoConverter;
        let layout = Layout::default();
        Compiler::new(&store, &converter, &layout, "site")
            .compile(&content, &output, Some(&static_src))
            .unwrap();

        assert!(output.join("static/styles/main.css").is_file());
        assert!(output.join("static/logo.svg").is_file());
        assert_eq!(mode_of(&output.join("static/logo.svg")), ARTIFACT_MODE);
        // The built-in stylesheet is only written when no static dir exists.
        assert!(!output.join("static/styles.css").exists());
    }

    #[test]
    fn test_html_path() {
        assert_eq!(html_path(Path::new("posts/a.md")), PathBuf::from("posts/a.html"));
        assert_eq!(html_path(Path::new("index.md")), PathBuf::from("index.html"));
        assert_eq!(html_path(Path::new("notes")), PathBuf::from("notes.html"));
    }
}
