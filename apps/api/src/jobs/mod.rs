//! Job listings: one-shot fetch from the job-search API into the local `jobs` table.

pub mod handlers;
pub mod jsearch;
pub mod store;
