//! Per-user records read and written wholesale: profile, settings, career profile.

pub mod handlers;
pub mod store;
