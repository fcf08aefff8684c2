#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Ditto HTTP API (v2) and the helpers the CLI uses
//! to turn them into stable output.
//!
//! - `models`: typed resources with an open extension bag (`additional_data`).
//! - `normalize`: canonical ordered records derived from those resources.
//! - `patch`: structural JSON diff/apply used by the revision diff command.

pub mod error;
pub mod models;
pub mod normalize;
pub mod patch;

pub use error::{PatchError, PatchResult};
pub use models::{Connection, ExtensionData, ProblemDetails, SearchResult, Thing, WhoAmI};
pub use normalize::{ApiResource, Normalized, NormalizedRecord, Resource, normalize};
pub use patch::{PatchOperation, apply, diff};
