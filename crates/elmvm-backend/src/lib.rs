mod constraint;
mod error;
mod select;
mod traits;
mod types;

pub use constraint::{Bound, Comparator, Constraint};
pub use error::{ElmvmError, ErrorKind, InstallStep};
pub use select::{LATEST_ALIAS, find_suitable, select_best};
pub use traits::{
    CommandOutput, CommandSpec, IsInstalled, ProcessRunner, RegistryClient, VersionCache,
};
pub use types::{
    ElmVersion, ParsedVersion, StageRank, VersionComponent, VersionParseError, VersionPool,
};
