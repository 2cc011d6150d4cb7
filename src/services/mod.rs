pub mod chat_api_openrouter;
pub mod content;
pub mod crosspost;
pub mod instagram;
pub mod ledger;
pub mod media;
pub mod settings;
pub mod text_processor;
