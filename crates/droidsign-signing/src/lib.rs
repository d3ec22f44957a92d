//! droidsign signing - locate and sign Android release packages
//!
//! The crate is split along the two stages of a signing run:
//! - [`locator`] finds `.apk` and `.aab` files in candidate directories
//! - [`orchestrator`] drives each package through align, sign, verify and
//!   optional relocation
//!
//! External tools (zipalign, apksigner, jarsigner) sit behind the
//! [`PackageTools`] and [`ToolRunner`] traits so the orchestration can be
//! exercised without an Android SDK.

pub mod credentials;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod package;
pub mod report;
pub mod runner;
pub mod toolchain;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use credentials::{materialize_keystore, SigningCredentials};
pub use error::{Result, SigningError};
pub use locator::locate;
pub use orchestrator::{FailurePolicy, Orchestrator, RunPlan};
pub use package::{PackageEntry, PackageKind};
pub use report::{EntryFailure, SignedArtifact, SigningReport};
pub use runner::{ProcessRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use toolchain::{find_jarsigner, SdkLocation};
pub use tools::{AlignMode, AndroidTools, PackageTools, SignTarget};
