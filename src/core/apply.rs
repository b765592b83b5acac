//! core/apply.rs
//!
//! The per-file apply loop.
//!
//! For each file, in order:
//! 1. open (failure => diagnostic, mark run failed, next file)
//! 2. optionally stage a recomputed length (counts as a change)
//! 3. build the read-only [`Context`]
//! 4. run every field's editor, compare old/new exactly, stage + report changes
//! 5. nothing changed => "Unchanged tags in FILE"; otherwise save once and
//!    report "Updating tags in FILE" (dry run: neither)
//! 6. the open file is dropped on every exit path, before the next one opens

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::report::Reporter;
use super::script::{CompiledEditor, Context, EditorSet};
use super::tags::{TagBackend, TagError, TagFile};
use super::types::{EditOutcome, Field, RunOptions, RunSummary};

/// How one successfully opened file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Unchanged,
    /// At least one change (saved, unless dry run).
    Updated,
}

/// Process every path in order. Per-file failures are reported and counted;
/// they never stop the loop.
pub fn process_files<B, O, E>(
    backend: &B,
    editors: &EditorSet,
    paths: &[PathBuf],
    opts: RunOptions,
    reporter: &mut Reporter<O, E>,
) -> RunSummary
where
    B: TagBackend,
    O: Write,
    E: Write,
{
    let mut summary = RunSummary::default();

    for path in paths {
        match process_file(backend, editors, path, opts, reporter) {
            Ok(status) => {
                summary.processed += 1;
                match status {
                    FileStatus::Unchanged => summary.unchanged += 1,
                    FileStatus::Updated => summary.updated += 1,
                }
            }
            Err(e) => {
                reporter.failure(path, &e);
                summary.failed += 1;
            }
        }
    }

    debug!(?summary, "run finished");
    summary
}

/// Run all seven editors against one file.
pub fn process_file<B, O, E>(
    backend: &B,
    editors: &EditorSet,
    path: &Path,
    opts: RunOptions,
    reporter: &mut Reporter<O, E>,
) -> Result<FileStatus, TagError>
where
    B: TagBackend,
    O: Write,
    E: Write,
{
    let mut file = backend.open(path)?;
    let mut changes = 0usize;

    if opts.update_length && !opts.dry_run {
        file.update_length();
        changes += 1;
    }

    let ctx = Context::new(path.to_string_lossy(), file.duration());

    for field in Field::ALL {
        let outcome = edit_field(&file, editors.get(field), &ctx);
        if !outcome.changed() {
            debug!(path = %path.display(), field = %outcome.field, "unchanged");
            continue;
        }

        changes += 1;
        if !opts.dry_run {
            file.set(outcome.field, &outcome.new);
        }
        reporter.field_change(&outcome);
    }

    if changes == 0 {
        reporter.unchanged(path);
        return Ok(FileStatus::Unchanged);
    }

    if !opts.dry_run {
        file.save()?;
        reporter.updating(path);
    }
    Ok(FileStatus::Updated)
}

fn edit_field<F: TagFile>(file: &F, editor: &CompiledEditor, ctx: &Context) -> EditOutcome {
    let field = editor.field();
    let old = file.get(field);
    let new = editor.apply(&old, ctx);
    EditOutcome { field, old, new }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::core::script::{ASCII_ONLY, Registry};
    use crate::core::types::{Field, Fragment};

    /// What the fake backend remembers about one file.
    #[derive(Debug, Clone, Default)]
    struct FakeTrack {
        fields: BTreeMap<Field, String>,
        duration: Duration,
        saves: usize,
        length_updates: usize,
        fail_save: bool,
    }

    /// In-memory backend; `opened`/`closed` record the open/close order.
    #[derive(Default)]
    struct FakeBackend {
        tracks: Rc<RefCell<BTreeMap<PathBuf, FakeTrack>>>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl FakeBackend {
        fn with(self, path: &str, track: FakeTrack) -> Self {
            self.tracks.borrow_mut().insert(PathBuf::from(path), track);
            self
        }

        fn track(&self, path: &str) -> FakeTrack {
            self.tracks.borrow()[Path::new(path)].clone()
        }
    }

    struct FakeFile {
        path: PathBuf,
        staged: FakeTrack,
        tracks: Rc<RefCell<BTreeMap<PathBuf, FakeTrack>>>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl TagBackend for FakeBackend {
        type File = FakeFile;

        fn open(&self, path: &Path) -> Result<FakeFile, TagError> {
            let staged = self.tracks.borrow().get(path).cloned().ok_or_else(|| {
                TagError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "No such file or directory",
                ))
            })?;
            self.log.borrow_mut().push(format!("open {}", path.display()));
            Ok(FakeFile {
                path: path.to_path_buf(),
                staged,
                tracks: Rc::clone(&self.tracks),
                log: Rc::clone(&self.log),
            })
        }
    }

    impl TagFile for FakeFile {
        fn get(&self, field: Field) -> String {
            self.staged.fields.get(&field).cloned().unwrap_or_default()
        }

        fn set(&mut self, field: Field, value: &str) {
            self.staged.fields.insert(field, value.to_string());
        }

        fn duration(&self) -> Duration {
            self.staged.duration
        }

        fn update_length(&mut self) {
            self.staged.length_updates += 1;
        }

        fn save(&mut self) -> Result<(), TagError> {
            if self.staged.fail_save {
                return Err(TagError::NotAFile);
            }
            self.staged.saves += 1;
            self.tracks
                .borrow_mut()
                .insert(self.path.clone(), self.staged.clone());
            Ok(())
        }
    }

    impl Drop for FakeFile {
        fn drop(&mut self) {
            self.log
                .borrow_mut()
                .push(format!("close {}", self.path.display()));
        }
    }

    fn track(title: &str) -> FakeTrack {
        let mut t = FakeTrack {
            duration: Duration::from_secs(125),
            ..Default::default()
        };
        t.fields.insert(Field::Title, title.to_string());
        t
    }

    fn editors(fragments: &[(Field, Fragment)]) -> EditorSet {
        let mut registry = Registry::new();
        for (field, fragment) in fragments {
            registry.register(*field, fragment.clone());
        }
        registry.compile().unwrap()
    }

    fn expr(s: &str) -> Fragment {
        Fragment::Expression(s.to_string())
    }

    fn run(
        backend: &FakeBackend,
        editors: &EditorSet,
        paths: &[&str],
        opts: RunOptions,
    ) -> (RunSummary, String, String) {
        let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
        let mut reporter = Reporter::new(Vec::new(), Vec::new(), opts.quiet);
        let summary = process_files(backend, editors, &paths, opts, &mut reporter);
        let (out, err) = reporter.into_parts();
        (
            summary,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn podcast_prefix() -> EditorSet {
        let prefix = expr("s/^/Podcast: / unless /^Podcast: /");
        editors(&[(Field::Title, prefix)])
    }

    #[test]
    fn test_prefix_scenario_updates_file() {
        let backend = FakeBackend::default().with("ep1.mp3", track("Episode 1"));
        let editors = podcast_prefix();
        let (summary, out, err) = run(&backend, &editors, &["ep1.mp3"], RunOptions::default());

        assert_eq!(
            out,
            "Title   : \"Episode 1\"\n        : \"Podcast: Episode 1\"\nUpdating tags in ep1.mp3\n"
        );
        assert_eq!(err, "");
        assert_eq!(summary.updated, 1);
        assert!(!summary.has_failures());

        let saved = backend.track("ep1.mp3");
        assert_eq!(saved.saves, 1);
        assert_eq!(saved.fields[&Field::Title], "Podcast: Episode 1");
    }

    #[test]
    fn test_second_run_is_unchanged() {
        let backend = FakeBackend::default().with("ep1.mp3", track("Episode 1"));
        let editors = podcast_prefix();
        run(&backend, &editors, &["ep1.mp3"], RunOptions::default());
        let (summary, out, _) = run(&backend, &editors, &["ep1.mp3"], RunOptions::default());

        assert_eq!(out, "Unchanged tags in ep1.mp3\n");
        assert_eq!(summary.unchanged, 1);
        assert_eq!(backend.track("ep1.mp3").saves, 1);
    }

    #[test]
    fn test_open_failure_does_not_stop_the_run() {
        let backend = FakeBackend::default().with("ok.mp3", track("Fine"));
        let (summary, out, err) = run(
            &backend,
            &editors(&[]),
            &["missing.mp3", "ok.mp3"],
            RunOptions::default(),
        );

        assert_eq!(err, "retag: missing.mp3: No such file or directory\n");
        assert_eq!(out, "Unchanged tags in ok.mp3\n");
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 1);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_dry_run_reports_same_diff_and_never_saves() {
        let backend = FakeBackend::default().with("ep1.mp3", track("Episode 1"));
        let editors = podcast_prefix();
        let dry = RunOptions {
            dry_run: true,
            ..Default::default()
        };

        let (_, first, _) = run(&backend, &editors, &["ep1.mp3"], dry);
        let (_, second, _) = run(&backend, &editors, &["ep1.mp3"], RunOptions::default());

        let diff = "Title   : \"Episode 1\"\n        : \"Podcast: Episode 1\"\n";
        assert_eq!(first, diff);
        assert!(second.starts_with(diff));
        assert_eq!(backend.track("ep1.mp3").saves, 1);
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let backend = FakeBackend::default().with("ep1.mp3", track("Episode 1"));
        let opts = RunOptions {
            dry_run: true,
            update_length: true,
            ..Default::default()
        };
        let (summary, _, _) = run(&backend, &podcast_prefix(), &["ep1.mp3"], opts);

        let after = backend.track("ep1.mp3");
        assert_eq!(after.saves, 0);
        assert_eq!(after.length_updates, 0);
        assert_eq!(after.fields[&Field::Title], "Episode 1");
        assert_eq!(summary.updated, 1);
    }

    #[test]
    fn test_quiet_prints_nothing_but_still_saves() {
        let backend = FakeBackend::default().with("ep1.mp3", track("Episode 1"));
        let opts = RunOptions {
            quiet: true,
            ..Default::default()
        };
        let (_, out, _) = run(&backend, &podcast_prefix(), &["ep1.mp3"], opts);
        assert_eq!(out, "");
        assert_eq!(backend.track("ep1.mp3").saves, 1);
    }

    #[test]
    fn test_update_length_counts_as_change() {
        let backend = FakeBackend::default().with("a.mp3", track("Same"));
        let opts = RunOptions {
            update_length: true,
            ..Default::default()
        };
        let (summary, out, _) = run(&backend, &editors(&[]), &["a.mp3"], opts);

        assert_eq!(out, "Updating tags in a.mp3\n");
        assert_eq!(summary.updated, 1);
        let after = backend.track("a.mp3");
        assert_eq!(after.length_updates, 1);
        assert_eq!(after.saves, 1);
    }

    #[test]
    fn test_context_reaches_every_field() {
        let backend = FakeBackend::default().with("show/ep.mp3", track("x"));
        let editors = editors(&[
            (Field::Comment, expr(r#"$_ = "$file $length $seconds""#)),
            (Field::Year, Fragment::Literal("2024".into())),
        ]);
        let opts = RunOptions::default();
        let (_, out, _) = run(&backend, &editors, &["show/ep.mp3"], opts);

        let after = backend.track("show/ep.mp3");
        assert_eq!(after.fields[&Field::Comment], "show/ep.mp3 2:05 125");
        assert_eq!(after.fields[&Field::Year], "2024");
        // Reports follow field order: comment before year.
        let comment = out.find("Comment").unwrap();
        let year = out.find("Year").unwrap();
        assert!(comment < year);
    }

    #[test]
    fn test_ascii_strips_all_fields() {
        let mut t = track("Caf\u{e9}");
        t.fields.insert(Field::Artist, "Bj\u{f6}rk".into());
        t.fields.insert(Field::Genre, "Pop".into());
        let backend = FakeBackend::default().with("a.mp3", t);

        let mut registry = Registry::new();
        registry.register_all(expr(ASCII_ONLY));
        let editors = registry.compile().unwrap();
        run(&backend, &editors, &["a.mp3"], RunOptions::default());

        let after = backend.track("a.mp3");
        assert_eq!(after.fields[&Field::Title], "Caf");
        assert_eq!(after.fields[&Field::Artist], "Bjrk");
        assert_eq!(after.fields[&Field::Genre], "Pop");
    }

    #[test]
    fn test_save_failure_is_per_file() {
        let mut broken = track("Episode 1");
        broken.fail_save = true;
        let backend = FakeBackend::default()
            .with("a.mp3", broken)
            .with("b.mp3", track("Episode 2"));
        let (editors, opts) = (podcast_prefix(), RunOptions::default());
        let (summary, out, err) = run(&backend, &editors, &["a.mp3", "b.mp3"], opts);

        assert!(err.starts_with("retag: a.mp3: "));
        assert!(!out.contains("Updating tags in a.mp3"));
        assert!(out.contains("Updating tags in b.mp3"));
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.updated, 1);
    }

    #[test]
    fn test_each_file_closed_before_next_opens() {
        let backend = FakeBackend::default()
            .with("a.mp3", track("A"))
            .with("b.mp3", track("B"));
        let (editors, opts) = (podcast_prefix(), RunOptions::default());
        run(&backend, &editors, &["a.mp3", "b.mp3"], opts);
        run(&backend, &editors, &["a.mp3"], opts);

        assert_eq!(
            *backend.log.borrow(),
            vec![
                "open a.mp3",
                "close a.mp3",
                "open b.mp3",
                "close b.mp3",
                "open a.mp3",
                "close a.mp3",
            ]
        );
    }
}
