pub mod media;
pub mod resolution;
pub mod stage;
pub mod types;
pub mod visibility;
