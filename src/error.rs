use thiserror::Error;

/// Every failure a query can surface. Each message is meant to be shown to
/// the user as-is and names the settings that need attention.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidConfiguration(String),

    #[error(
        "Cannot find or create the build tree directory. Ensure the \
         'Cmake Llvm Coverage: Build Tree Directory' setting is a valid relative path."
    )]
    BuildTreeUnavailable,

    #[error(
        "Cannot find the build command. Ensure the 'Cmake Llvm Coverage: Build Command' setting is \
         correctly set. Have you verified your PATH environment variable?"
    )]
    BuildCommandUnreachable,

    #[error(
        "Could not build the specified target {target}. Ensure 'Cmake Llvm Coverage: Build Target' \
         setting is properly set."
    )]
    TargetBuildFailed { target: String },

    #[error(
        "Cannot resolve the coverage report file path in the build tree directory. \
         Ensure that both 'Cmake Llvm Coverage: Build Tree Directory' and 'Cmake Llvm Coverage: Report File Name' \
         settings are correctly set."
    )]
    ReportNotFound,

    #[error(
        "More than one coverage report file has been found in the build tree directory. \
         Ensure that both 'Cmake Llvm Coverage: Build Tree Directory' and 'Cmake Llvm Coverage: Report File Name' \
         settings are correctly set."
    )]
    AmbiguousReport { matches: usize },

    #[error(
        "Invalid coverage report file has been found in the build tree directory. \
         The coverage report file must contain an llvm coverage report in json format. \
         Ensure that both 'Cmake Llvm Coverage: Build Tree Directory' and 'Cmake Llvm Coverage: Report File Name' \
         settings are correctly set."
    )]
    InvalidReportFormat { cause: String },

    #[error(
        "Cannot find any summary coverage info for the file {0}. \
         Ensure this source file is covered by a test in your project."
    )]
    UnhandledSourceFile(String),

    #[error(
        "Cannot find any uncovered code regions for the file {0}. \
         Ensure this source file is covered by a test in your project."
    )]
    UnhandledRegionsForSourceFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discriminant of [`Error`], stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfiguration,
    BuildTreeUnavailable,
    BuildCommandUnreachable,
    TargetBuildFailed,
    ReportNotFound,
    AmbiguousReport,
    InvalidReportFormat,
    UnhandledSourceFile,
    UnhandledRegionsForSourceFile,
    Io,
}

impl Error {
    pub fn invalid_report(cause: impl Into<String>) -> Self {
        Error::InvalidReportFormat {
            cause: cause.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Error::BuildTreeUnavailable => ErrorKind::BuildTreeUnavailable,
            Error::BuildCommandUnreachable => ErrorKind::BuildCommandUnreachable,
            Error::TargetBuildFailed { .. } => ErrorKind::TargetBuildFailed,
            Error::ReportNotFound => ErrorKind::ReportNotFound,
            Error::AmbiguousReport { .. } => ErrorKind::AmbiguousReport,
            Error::InvalidReportFormat { .. } => ErrorKind::InvalidReportFormat,
            Error::UnhandledSourceFile(_) => ErrorKind::UnhandledSourceFile,
            Error::UnhandledRegionsForSourceFile(_) => ErrorKind::UnhandledRegionsForSourceFile,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
