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
#![allow(clippy::redundant_pub_crate)]

//! Command-line client for the Eclipse Ditto HTTP API.
//!
//! Layout:
//! - `cli.rs`: argument parsing, credential scope selection, and dispatch
//! - `commands/`: command handlers grouped by resource
//! - `client.rs`: session context, credentials, HTTP helpers, and errors
//! - `output.rs`: JSON, table, and leveled message renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;

pub use cli::run;
