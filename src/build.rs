use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapters::{ProcessOutput, ProcessRunner, ProgressReporter};
use crate::error::{Error, Result};
use crate::settings::Settings;

/// Lines of captured output kept in the log when an invocation fails.
const OUTPUT_TAIL_LINES: usize = 20;

/// Runs the configured CMake-compatible build command: one invocation to
/// configure the build tree, one to build the coverage target.
pub struct BuildInvoker<'a> {
    settings: &'a Settings,
    process: Arc<dyn ProcessRunner>,
    progress: Arc<dyn ProgressReporter>,
}

impl<'a> BuildInvoker<'a> {
    pub fn new(
        settings: &'a Settings,
        process: Arc<dyn ProcessRunner>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            settings,
            process,
            progress,
        }
    }

    pub async fn build_target(&self, build_tree_directory: &Path) -> Result<()> {
        self.configure(build_tree_directory).await?;
        self.build(build_tree_directory).await
    }

    async fn configure(&self, build_tree_directory: &Path) -> Result<()> {
        let command = self.settings.build_command.trim();
        if command.is_empty() {
            debug!("build command setting is empty");
            return Err(Error::BuildCommandUnreachable);
        }

        self.progress.report("configuring the build tree directory");
        let args: Vec<OsString> = vec![
            "-S".into(),
            self.settings.root_directory.clone().into_os_string(),
            "-B".into(),
            build_tree_directory.as_os_str().to_owned(),
        ];

        match self.process.execute(command, &args).await {
            Ok(output) if output.success => Ok(()),
            Ok(output) => {
                log_failure("configure", command, &output);
                Err(Error::BuildCommandUnreachable)
            }
            Err(e) => {
                warn!(command, error = %e, "cannot spawn build command");
                Err(Error::BuildCommandUnreachable)
            }
        }
    }

    async fn build(&self, build_tree_directory: &Path) -> Result<()> {
        let command = self.settings.build_command.trim();
        let target = &self.settings.build_target;
        if target.trim().is_empty() {
            debug!("build target setting is empty");
            return Err(Error::TargetBuildFailed {
                target: target.clone(),
            });
        }

        self.progress.report(&format!("building the {target} target"));
        let args: Vec<OsString> = vec![
            "--build".into(),
            build_tree_directory.as_os_str().to_owned(),
            "--target".into(),
            target.into(),
        ];

        match self.process.execute(command, &args).await {
            Ok(output) if output.success => Ok(()),
            Ok(output) => {
                log_failure("build", command, &output);
                Err(Error::TargetBuildFailed {
                    target: target.clone(),
                })
            }
            Err(e) => {
                warn!(command, error = %e, "cannot spawn build command");
                Err(Error::BuildCommandUnreachable)
            }
        }
    }
}

fn log_failure(step: &str, command: &str, output: &ProcessOutput) {
    warn!(
        step,
        command,
        code = ?output.code,
        stdout = %tail(&output.stdout),
        stderr = %tail(&output.stderr),
        "build command failed"
    );
}

fn tail(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(OUTPUT_TAIL_LINES)..].join("\n")
}
