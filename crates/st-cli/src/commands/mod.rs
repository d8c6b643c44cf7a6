//! Command implementations

pub(crate) mod common;
pub(crate) mod diff;
pub(crate) mod history;
pub(crate) mod migrate;
pub(crate) mod status;
pub(crate) mod unlock;
pub(crate) mod validate;
