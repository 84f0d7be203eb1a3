pub mod career;
pub mod insight;
pub mod job;
pub mod profile;
pub mod resume;
pub mod subscription;
