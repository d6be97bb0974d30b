#![allow(dead_code)]

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use llvm_cov_regions::adapters::{
    Adapters, EntryKind, FileSystem, ProcessOutput, ProcessRunner, ProgressReporter, ReportStream,
};
use llvm_cov_regions::settings::Settings;

pub const ROOT: &str = "/a";
pub const SOURCE_FILE: &str = "/a/source/file.cpp";

pub const VALID_REPORT: &str = r#"{
  "data": [
    {
      "files": [
        {
          "filename": "/a/source/file.cpp",
          "summary": { "regions": { "count": 2, "covered": 2, "notcovered": 0, "percent": 100 } }
        }
      ],
      "functions": [
        {
          "filenames": ["/a/source/file.cpp"],
          "regions": [[4, 52, 4, 54, 1, 0, 0, 0], [6, 53, 6, 71, 0, 0, 0, 0]]
        }
      ]
    }
  ],
  "type": "llvm.coverage.json.export",
  "version": "2.0.1"
}"#;

pub const INVALID_REPORTS: [&str; 3] = ["", "foo", r#"{"data":[{"foo":"bar"},{}]}"#];

/// In-memory filesystem with scripted answers.
pub struct FakeFileSystem {
    pub stat_succeeds: bool,
    pub mkdir_succeeds: bool,
    pub glob_matches: Vec<PathBuf>,
    pub report: String,
    pub mkdir_calls: Mutex<Vec<PathBuf>>,
    pub glob_calls: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeFileSystem {
    /// Existing build tree, exactly one report holding `report`.
    pub fn with_report(report: &str) -> Self {
        Self {
            stat_succeeds: true,
            mkdir_succeeds: false,
            glob_matches: vec![PathBuf::from("/a/build/coverage.json")],
            report: report.to_string(),
            mkdir_calls: Mutex::new(Vec::new()),
            glob_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            stat_succeeds: false,
            mkdir_succeeds: false,
            glob_matches: vec![],
            ..Self::with_report("")
        }
    }
}

#[async_trait]
impl FileSystem for FakeFileSystem {
    async fn stat(&self, _path: &Path) -> io::Result<EntryKind> {
        if self.stat_succeeds {
            Ok(EntryKind::Directory)
        } else {
            Err(io::ErrorKind::NotFound.into())
        }
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.mkdir_calls.lock().unwrap().push(path.to_path_buf());
        if self.mkdir_succeeds {
            Ok(())
        } else {
            Err(io::ErrorKind::PermissionDenied.into())
        }
    }

    async fn glob_search(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        self.glob_calls
            .lock()
            .unwrap()
            .push((dir.to_path_buf(), pattern.to_string()));
        Ok(self.glob_matches.clone())
    }

    async fn open_read_stream(&self, _path: &Path) -> io::Result<ReportStream> {
        Ok(Box::pin(io::Cursor::new(self.report.clone().into_bytes())))
    }
}

/// How a fake process invocation ends.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Succeed,
    ExitWithError,
    CannotSpawn,
}

/// Answers the configure and the build invocations separately.
pub struct FakeProcess {
    pub configure: Outcome,
    pub build: Outcome,
    pub calls: Mutex<Vec<(String, Vec<OsString>)>>,
}

impl FakeProcess {
    pub fn new(configure: Outcome, build: Outcome) -> Self {
        Self {
            configure,
            build,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Outcome::Succeed, Outcome::Succeed)
    }
}

#[async_trait]
impl ProcessRunner for FakeProcess {
    async fn execute(&self, command: &str, args: &[OsString]) -> io::Result<ProcessOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), args.to_vec()));

        let outcome = if args.first().is_some_and(|a| a == "--build") {
            self.build
        } else {
            self.configure
        };
        match outcome {
            Outcome::Succeed => Ok(ProcessOutput {
                success: true,
                code: Some(0),
                ..Default::default()
            }),
            Outcome::ExitWithError => Ok(ProcessOutput {
                success: false,
                code: Some(1),
                stderr: "CMake Error: something went wrong".to_string(),
                ..Default::default()
            }),
            Outcome::CannotSpawn => Err(io::ErrorKind::NotFound.into()),
        }
    }
}

/// Keeps every progress line.
#[derive(Default)]
pub struct RecordingProgress {
    pub lines: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}

pub fn settings() -> Settings {
    Settings::with_defaults(ROOT)
}

pub fn adapters(fs: FakeFileSystem, process: FakeProcess) -> (Adapters, Arc<FakeFileSystem>, Arc<FakeProcess>) {
    let fs = Arc::new(fs);
    let process = Arc::new(process);
    let adapters = Adapters {
        fs: fs.clone(),
        process: process.clone(),
        progress: Arc::new(RecordingProgress::default()),
    };
    (adapters, fs, process)
}
