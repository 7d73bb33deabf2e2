//! Release version resolution: release types, release branch naming and the
//! ordered set of versions a staging run cuts.
pub mod branch;
pub mod release_type;
pub mod resolver;
pub mod versions;

pub use branch::{BranchConventions, ReleaseBranch};
pub use release_type::ReleaseType;
pub use resolver::{generate_release_version, parse_build_version};
pub use versions::Versions;
