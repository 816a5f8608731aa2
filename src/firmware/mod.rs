//! Upstream firmware metadata: URL templates, commit resolution, release
//! enumeration and build discovery.

pub mod commits;
pub mod fetch;
pub mod releases;
pub mod resolver;
pub mod sources;

pub use commits::{list_recent_builds, BuildSummary};
pub use releases::enumerate_releases;
pub use resolver::resolve_commit;
pub use sources::UpstreamSources;
