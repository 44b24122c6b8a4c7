//! End-to-end tests for pdfsqueeze.
//!
//! Most tests drive the full run through an in-process engine that writes
//! half of the input bytes, so they need no Ghostscript install and give
//! exact, reproducible sizes. `test_real_ghostscript` uses the real engine
//! and is skipped when no `gs` can be found.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use pdfsqueeze::{
    run, CompressionEngine, FileError, FileOutcome, FileReport, Ghostscript, InvocationRequest,
    Mode, Preset, RunConfig, RunProgressCallback, SqueezeError,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Writes the first half of the input to the output; fails for any input
/// whose file name contains `fail_marker`.
struct HalvingEngine {
    fail_marker: Option<&'static str>,
    calls: Mutex<Vec<InvocationRequest>>,
}

impl HalvingEngine {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_marker: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing_on(marker: &'static str) -> Arc<Self> {
        Arc::new(Self {
            fail_marker: Some(marker),
            calls: Mutex::new(Vec::new()),
        })
    }
}

impl CompressionEngine for HalvingEngine {
    fn name(&self) -> &str {
        "halving"
    }

    fn compress(&self, request: &InvocationRequest) -> Result<(), SqueezeError> {
        self.calls.lock().unwrap().push(request.clone());
        let name = request.input.file_name().unwrap().to_string_lossy();
        if let Some(marker) = self.fail_marker {
            if name.contains(marker) {
                return Err(SqueezeError::EngineFailed {
                    input: request.input.clone(),
                    code: Some(1),
                    stderr: "Unrecoverable error, exit code 1".into(),
                });
            }
        }
        let bytes = fs::read(&request.input).unwrap();
        fs::write(&request.output, &bytes[..bytes.len() / 2]).unwrap();
        Ok(())
    }
}

fn write_file(path: &Path, len: usize) -> Vec<u8> {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let bytes: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    fs::write(path, &bytes).unwrap();
    bytes
}

/// Relative paths of every entry (files and directories) under `root`.
fn tree(root: &Path) -> Vec<String> {
    let mut out = Vec::new();
    fn visit(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            if path.is_dir() {
                out.push(format!("{rel}/"));
                visit(root, &path, out);
            } else {
                out.push(rel);
            }
        }
    }
    visit(root, root, &mut out);
    out.sort();
    out
}

// ── Single-file mode ─────────────────────────────────────────────────────────

#[test]
fn test_single_in_place_with_backup() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.pdf");
    let original = write_file(&input, 1000);

    let config = RunConfig::builder(&input)
        .engine(HalvingEngine::new())
        .backup(true)
        .build()
        .unwrap();
    let summary = run(&config).expect("run should succeed");

    assert_eq!(fs::metadata(&input).unwrap().len(), 500);
    let backup = dir.path().join("report_BACKUP.pdf");
    assert_eq!(fs::read(&backup).unwrap(), original);
    assert_eq!(tree(dir.path()), vec!["report.pdf", "report_BACKUP.pdf"]);

    let report = summary.reports().next().unwrap();
    assert_eq!(report.output, input);
    assert_eq!(report.ratio_percent(), "50%");
}

#[test]
fn test_single_in_place_without_backup() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.pdf");
    write_file(&input, 800);

    let config = RunConfig::builder(&input)
        .engine(HalvingEngine::new())
        .build()
        .unwrap();
    run(&config).unwrap();

    assert_eq!(fs::metadata(&input).unwrap().len(), 400);
    assert_eq!(tree(dir.path()), vec!["report.pdf"]);
}

#[test]
fn test_single_explicit_pdf_output_is_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in/report.pdf");
    write_file(&input, 100);
    let out = dir.path().join("elsewhere/Renamed.PDF");

    let engine = HalvingEngine::new();
    let config = RunConfig::builder(&input)
        .engine(engine.clone())
        .output(&out)
        .preset(Preset::Ebook)
        .build()
        .unwrap();
    run(&config).unwrap();

    assert_eq!(fs::metadata(&out).unwrap().len(), 50);
    assert_eq!(fs::metadata(&input).unwrap().len(), 100, "input untouched");

    let calls = engine.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].output, out);
    assert_eq!(calls[0].preset, Preset::Ebook);
    assert_eq!(calls[0].compatibility_level, "1.4");
}

#[test]
fn test_single_output_directory_keeps_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.pdf");
    write_file(&input, 100);
    let out_dir = dir.path().join("compressed");

    let config = RunConfig::builder(&input)
        .engine(HalvingEngine::new())
        .output(&out_dir)
        .build()
        .unwrap();
    run(&config).unwrap();

    assert_eq!(fs::metadata(out_dir.join("report.pdf")).unwrap().len(), 50);
}

#[test]
fn test_single_missing_input_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.pdf");

    let config = RunConfig::builder(dir.path().join("missing.pdf"))
        .engine(HalvingEngine::new())
        .output(&out)
        .build()
        .unwrap();
    let err = run(&config).unwrap_err();

    assert!(matches!(err, SqueezeError::InputNotFound { .. }));
    assert!(!out.exists());
}

#[test]
fn test_single_engine_failure_is_fatal_and_keeps_original() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.pdf");
    let original = write_file(&input, 300);

    let config = RunConfig::builder(&input)
        .engine(HalvingEngine::failing_on("bad"))
        .backup(true)
        .build()
        .unwrap();
    let err = run(&config).unwrap_err();

    assert!(matches!(err, SqueezeError::EngineFailed { code: Some(1), .. }));
    assert_eq!(fs::read(&input).unwrap(), original);
    assert_eq!(tree(dir.path()), vec!["bad.pdf"], "no backup or scratch left");
}

#[cfg(unix)]
#[test]
fn test_single_in_place_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("private.pdf");
    write_file(&input, 1000);
    fs::set_permissions(&input, fs::Permissions::from_mode(0o640)).unwrap();

    let config = RunConfig::builder(&input)
        .engine(HalvingEngine::new())
        .build()
        .unwrap();
    run(&config).unwrap();

    let meta = fs::metadata(&input).unwrap();
    assert_eq!(meta.len(), 500);
    assert_eq!(meta.permissions().mode() & 0o777, 0o640);
}

#[cfg(unix)]
#[test]
fn test_single_in_place_through_symlink() {
    let dir = tempfile::tempdir().unwrap();
    let real = dir.path().join("real.pdf");
    let link = dir.path().join("link.pdf");
    let original = write_file(&real, 100);
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let config = RunConfig::builder(&link)
        .engine(HalvingEngine::new())
        .backup(true)
        .build()
        .unwrap();
    run(&config).unwrap();

    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::metadata(&real).unwrap().len(), 50);
    assert_eq!(fs::read(dir.path().join("link_BACKUP.pdf")).unwrap(), original);
}

// ── Directory mode ───────────────────────────────────────────────────────────

fn sample_tree(root: &Path) {
    write_file(&root.join("a.pdf"), 1000);
    write_file(&root.join("notes.txt"), 10);
    write_file(&root.join("sub/B.PDF"), 400);
    write_file(&root.join("sub/image.png"), 10);
    write_file(&root.join("sub/deeper/c.Pdf"), 200);
    fs::create_dir_all(root.join("empty")).unwrap();
}

#[test]
fn test_directory_mirror() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    sample_tree(src.path());
    let out = dst.path().join("small");

    let config = RunConfig::builder(src.path())
        .mode(Mode::Directory)
        .engine(HalvingEngine::new())
        .output(&out)
        .build()
        .unwrap();
    let summary = run(&config).unwrap();

    assert_eq!(
        tree(&out),
        vec![
            "a.pdf",
            "empty/",
            "sub/",
            "sub/B.PDF",
            "sub/deeper/",
            "sub/deeper/c.Pdf",
        ]
    );
    assert_eq!(fs::metadata(out.join("sub/B.PDF")).unwrap().len(), 200);

    assert_eq!(summary.stats.total_files, 5);
    assert_eq!(summary.stats.compressed, 3);
    assert_eq!(summary.stats.skipped, 2);
    assert_eq!(summary.stats.failed, 0);
    assert_eq!(summary.stats.bytes_before, 1600);
    assert_eq!(summary.stats.bytes_after, 800);

    // Sources are untouched.
    assert_eq!(fs::metadata(src.path().join("a.pdf")).unwrap().len(), 1000);
}

#[test]
fn test_directory_collects_failures_and_continues() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_file(&src.path().join("1-good.pdf"), 100);
    write_file(&src.path().join("2-bad.pdf"), 100);
    write_file(&src.path().join("3-good.pdf"), 100);

    let config = RunConfig::builder(src.path())
        .mode(Mode::Directory)
        .engine(HalvingEngine::failing_on("bad"))
        .output(dst.path())
        .build()
        .unwrap();
    let summary = run(&config).unwrap();

    assert_eq!(summary.stats.compressed, 2);
    assert_eq!(summary.stats.failed, 1);
    assert!(dst.path().join("3-good.pdf").exists());
    assert!(!dst.path().join("2-bad.pdf").exists());

    match &summary.files[1] {
        FileOutcome::Failed { error, .. } => {
            assert!(matches!(error, FileError::EngineFailed { .. }));
        }
        other => panic!("expected failure, got {other:?}"),
    }

    match summary.into_result() {
        Err(SqueezeError::PartialFailure { failed: 1, total: 3, .. }) => {}
        other => panic!("expected PartialFailure, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_directory_records_nonzero_engine_exit() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_file(&src.path().join("a.pdf"), 100);

    // `false` accepts any arguments and exits 1, like a Ghostscript crash.
    let config = RunConfig::builder(src.path())
        .mode(Mode::Directory)
        .engine_program("false")
        .output(dst.path())
        .build()
        .unwrap();
    let summary = run(&config).unwrap();

    assert_eq!(summary.stats.failed, 1);
    match &summary.files[0] {
        FileOutcome::Failed { error, .. } => {
            assert!(
                matches!(error, FileError::EngineFailed { detail, .. } if detail.starts_with("exit code 1")),
                "got {error:?}"
            );
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(matches!(
        summary.into_result(),
        Err(SqueezeError::AllFilesFailed { total: 1, .. })
    ));
}

#[test]
fn test_directory_in_place_with_backups() {
    let src = tempfile::tempdir().unwrap();
    sample_tree(src.path());

    let config = RunConfig::builder(src.path())
        .mode(Mode::Directory)
        .engine(HalvingEngine::new())
        .backup(true)
        .build()
        .unwrap();
    run(&config).unwrap();

    assert_eq!(fs::metadata(src.path().join("a.pdf")).unwrap().len(), 500);
    assert_eq!(fs::metadata(src.path().join("a_BACKUP.pdf")).unwrap().len(), 1000);
    assert_eq!(
        fs::metadata(src.path().join("sub/deeper/c_BACKUP.Pdf")).unwrap().len(),
        200
    );
    assert_eq!(fs::metadata(src.path().join("notes.txt")).unwrap().len(), 10);
    assert!(
        tree(src.path()).iter().all(|p| !p.contains(".pdfsqueeze-")),
        "scratch directories must be cleaned up"
    );
}

#[test]
fn test_directory_mode_rejects_file_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.pdf");
    write_file(&input, 10);

    let config = RunConfig::builder(&input)
        .mode(Mode::Directory)
        .engine(HalvingEngine::new())
        .build()
        .unwrap();
    assert!(matches!(
        run(&config),
        Err(SqueezeError::NotADirectory { .. })
    ));
}

#[test]
fn test_progress_events_in_order() {
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl RunProgressCallback for Recorder {
        fn on_run_start(&self, total_files: usize) {
            self.events.lock().unwrap().push(format!("start {total_files}"));
        }
        fn on_file_complete(&self, index: usize, _total: usize, _report: &FileReport) {
            self.events.lock().unwrap().push(format!("done {index}"));
        }
        fn on_file_skipped(&self, index: usize, _total: usize, _input: &Path) {
            self.events.lock().unwrap().push(format!("skip {index}"));
        }
        fn on_run_complete(&self, total: usize, compressed: usize, failed: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("end {total} {compressed} {failed}"));
        }
    }

    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_file(&src.path().join("a.pdf"), 10);
    write_file(&src.path().join("b.txt"), 10);

    let recorder = Arc::new(Recorder::default());
    let config = RunConfig::builder(src.path())
        .mode(Mode::Directory)
        .engine(HalvingEngine::new())
        .output(dst.path())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    run(&config).unwrap();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["start 2", "done 1", "skip 2", "end 2 1 0"]
    );
}

#[test]
fn test_progress_told_when_run_aborts() {
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl RunProgressCallback for Recorder {
        fn on_run_start(&self, total_files: usize) {
            self.events.lock().unwrap().push(format!("start {total_files}"));
        }
        fn on_run_complete(&self, _total: usize, _compressed: usize, _failed: usize) {
            self.events.lock().unwrap().push("end".into());
        }
        fn on_run_failed(&self, error: &str) {
            assert!(error.contains("could not be started"), "got: {error}");
            self.events.lock().unwrap().push("failed".into());
        }
    }

    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_file(&src.path().join("a.pdf"), 10);
    write_file(&src.path().join("b.pdf"), 10);

    let recorder = Arc::new(Recorder::default());
    let config = RunConfig::builder(src.path())
        .mode(Mode::Directory)
        .engine_program("pdfsqueeze-not-a-real-gs")
        .output(dst.path())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    assert!(matches!(
        run(&config),
        Err(SqueezeError::EngineNotFound { .. })
    ));
    assert_eq!(*recorder.events.lock().unwrap(), vec!["start 2", "failed"]);
}

// ── Real Ghostscript (skipped when not installed) ────────────────────────────

const MINIMAL_PDF: &str = "%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] /Contents 4 0 R >> endobj
4 0 obj << /Length 35 >> stream
0 0 1 rg 20 20 160 160 re f
endstream endobj
trailer << /Root 1 0 R >>
%%EOF
";

#[test]
fn test_real_ghostscript() {
    let gs = match Ghostscript::detect() {
        Ok(gs) => gs,
        Err(_) => {
            println!("SKIP: Ghostscript not installed");
            return;
        }
    };

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("square.pdf");
    fs::write(&input, MINIMAL_PDF).unwrap();
    let out = dir.path().join("square-small.pdf");

    let config = RunConfig::builder(&input)
        .engine(Arc::new(gs))
        .output(&out)
        .preset(Preset::Screen)
        .build()
        .unwrap();
    let summary = run(&config).expect("Ghostscript run should succeed");

    let bytes = fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF"), "output must be a PDF");
    assert_eq!(summary.stats.compressed, 1);
    println!("{}", summary.reports().next().unwrap());
}

// ── Binary ───────────────────────────────────────────────────────────────────

#[cfg(feature = "cli")]
fn bin() -> std::process::Command {
    std::process::Command::new(env!("CARGO_BIN_EXE_pdfsqueeze"))
}

#[cfg(feature = "cli")]
#[test]
fn test_cli_missing_input_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let out: PathBuf = dir.path().join("out.pdf");

    let status = bin()
        .arg(dir.path().join("missing.pdf"))
        .arg("-o")
        .arg(&out)
        .arg("--gs")
        .arg("pdfsqueeze-not-a-real-gs")
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(1));
    assert!(!out.exists());
}

#[cfg(feature = "cli")]
#[test]
fn test_cli_non_pdf_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    write_file(&input, 10);

    let status = bin()
        .arg(&input)
        .arg("--gs")
        .arg("pdfsqueeze-not-a-real-gs")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[cfg(feature = "cli")]
#[test]
fn test_cli_missing_engine_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.pdf");
    let original = write_file(&input, 10);

    let output = bin()
        .arg(&input)
        .args(["-cm", "0", "--gs", "pdfsqueeze-not-a-real-gs"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not be started"));
    assert_eq!(fs::read(&input).unwrap(), original);
}
