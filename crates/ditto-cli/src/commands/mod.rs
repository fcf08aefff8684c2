//! Command handlers grouped by resource.

pub(crate) mod connections;
pub(crate) mod devops;
pub(crate) mod permission;
pub(crate) mod policies;
pub(crate) mod search;
pub(crate) mod things;
pub(crate) mod whoami;
