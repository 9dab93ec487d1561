use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Installation step that failed; each one surfaces as its own [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    NpmInit,
    ElmInstall,
    NpmBin,
    BinPathWrite,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NpmInit => write!(f, "npm init"),
            Self::ElmInstall => write!(f, "npm install"),
            Self::NpmBin => write!(f, "bin path lookup"),
            Self::BinPathWrite => write!(f, "bin path write"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElmvmError {
    #[error("Could not reach the npm registry: {details}")]
    NpmCommunication { details: String },

    #[error("The npm registry returned no versions for {package}")]
    NoElmVersions { package: String },

    #[error("Could not read version cache {}: {details}", .path.display())]
    VersionCacheRead { path: PathBuf, details: String },

    #[error("Could not write version cache {}: {details}", .path.display())]
    VersionCacheWrite { path: PathBuf, details: String },

    #[error("No Elm project found in {} or any parent directory", .start.display())]
    NoElmProject { start: PathBuf },

    #[error("Could not read project manifest {}: {details}", .path.display())]
    ManifestRead { path: PathBuf, details: String },

    #[error("{} does not declare a string \"{key}\"", .path.display())]
    MissingElmVersion { path: PathBuf, key: String },

    #[error("Could not parse version constraint: {constraint}")]
    ParseConstraint { constraint: String },

    #[error("No Elm version matches {requested}")]
    NoMatchingVersion { requested: String },

    #[error("Installing Elm {version} failed during {step}: {details}")]
    InstallFailed {
        step: InstallStep,
        version: String,
        details: String,
    },

    #[error("Could not read bin path of Elm {version}: {details}")]
    BinPathRead { version: String, details: String },

    #[error("Failed to run elm: {details}")]
    ElmCommand { details: String },

    #[error("Failed to run npm: {details}")]
    NpmCommand { details: String },

    #[error("npm not found")]
    NpmNotFound,

    #[error("Elm {version} is not installed")]
    NotInstalled { version: String },

    #[error("IO error ({kind}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Unexpected error in {context}: {details}")]
    Unexpected {
        context: &'static str,
        details: String,
    },
}

/// Fieldless discriminant of [`ElmvmError`], used for exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unknown,
    NpmCommunicationError,
    NoElmVersions,
    VersionCacheReadFail,
    VersionCacheWriteFail,
    NoElmProject,
    ManifestReadFailed,
    MissingElmVersion,
    ParseConstraintFailed,
    NoMatchingVersion,
    NpmInitFailed,
    NpmElmInstallFailed,
    NpmBinFailed,
    BinPathWriteFailed,
    BinPathReadFailed,
    ElmCommandFailed,
    NpmCommandFailed,
    NpmNotFound,
    NotInstalled,
    Io,
}

impl ErrorKind {
    pub const ALL: [Self; 20] = [
        Self::Unknown,
        Self::NpmCommunicationError,
        Self::NoElmVersions,
        Self::VersionCacheReadFail,
        Self::VersionCacheWriteFail,
        Self::NoElmProject,
        Self::ManifestReadFailed,
        Self::MissingElmVersion,
        Self::ParseConstraintFailed,
        Self::NoMatchingVersion,
        Self::NpmInitFailed,
        Self::NpmElmInstallFailed,
        Self::NpmBinFailed,
        Self::BinPathWriteFailed,
        Self::BinPathReadFailed,
        Self::ElmCommandFailed,
        Self::NpmCommandFailed,
        Self::NpmNotFound,
        Self::NotInstalled,
        Self::Io,
    ];

    /// Process exit status reported for this kind. `Unknown` owns the
    /// generic code 1.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Unknown => 1,
            Self::NpmCommunicationError => 2,
            Self::NoElmVersions => 3,
            Self::VersionCacheReadFail => 4,
            Self::VersionCacheWriteFail => 5,
            Self::NoElmProject => 6,
            Self::ManifestReadFailed => 7,
            Self::MissingElmVersion => 8,
            Self::ParseConstraintFailed => 9,
            Self::NoMatchingVersion => 10,
            Self::NpmInitFailed => 11,
            Self::NpmElmInstallFailed => 12,
            Self::NpmBinFailed => 13,
            Self::BinPathWriteFailed => 14,
            Self::BinPathReadFailed => 15,
            Self::ElmCommandFailed => 16,
            Self::NpmCommandFailed => 17,
            Self::NpmNotFound => 18,
            Self::NotInstalled => 19,
            Self::Io => 20,
        }
    }
}

impl ElmvmError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NpmCommunication { .. } => ErrorKind::NpmCommunicationError,
            Self::NoElmVersions { .. } => ErrorKind::NoElmVersions,
            Self::VersionCacheRead { .. } => ErrorKind::VersionCacheReadFail,
            Self::VersionCacheWrite { .. } => ErrorKind::VersionCacheWriteFail,
            Self::NoElmProject { .. } => ErrorKind::NoElmProject,
            Self::ManifestRead { .. } => ErrorKind::ManifestReadFailed,
            Self::MissingElmVersion { .. } => ErrorKind::MissingElmVersion,
            Self::ParseConstraint { .. } => ErrorKind::ParseConstraintFailed,
            Self::NoMatchingVersion { .. } => ErrorKind::NoMatchingVersion,
            Self::InstallFailed { step, .. } => match step {
                InstallStep::NpmInit => ErrorKind::NpmInitFailed,
                InstallStep::ElmInstall => ErrorKind::NpmElmInstallFailed,
                InstallStep::NpmBin => ErrorKind::NpmBinFailed,
                InstallStep::BinPathWrite => ErrorKind::BinPathWriteFailed,
            },
            Self::BinPathRead { .. } => ErrorKind::BinPathReadFailed,
            Self::ElmCommand { .. } => ErrorKind::ElmCommandFailed,
            Self::NpmCommand { .. } => ErrorKind::NpmCommandFailed,
            Self::NpmNotFound => ErrorKind::NpmNotFound,
            Self::NotInstalled { .. } => ErrorKind::NotInstalled,
            Self::Io { .. } => ErrorKind::Io,
            Self::Unexpected { .. } => ErrorKind::Unknown,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    pub fn install_failed(
        step: InstallStep,
        version: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::InstallFailed {
            step,
            version: version.into(),
            details: details.into(),
        }
    }

    pub fn npm_communication<E>(error: E) -> Self
    where
        E: fmt::Display,
    {
        Self::NpmCommunication {
            details: error.to_string(),
        }
    }

    pub fn cache_read(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::VersionCacheRead {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn cache_write(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::VersionCacheWrite {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn no_matching_version(requested: impl Into<String>) -> Self {
        Self::NoMatchingVersion {
            requested: requested.into(),
        }
    }

    pub fn unexpected<E>(context: &'static str, error: E) -> Self
    where
        E: fmt::Display,
    {
        Self::Unexpected {
            context,
            details: error.to_string(),
        }
    }
}

impl From<std::io::Error> for ElmvmError {
    fn from(err: std::io::Error) -> Self {
        ElmvmError::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
