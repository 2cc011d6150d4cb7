pub mod mastodon;
pub mod thread;
pub mod utils;

pub use mastodon::MastodonPublisher;
pub use thread::publish_thread;
pub use crate::traits::publisher::StatusApi;
