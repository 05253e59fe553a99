pub mod server;
pub mod locale;
pub mod i18n;
pub mod identity;
pub mod content;
pub mod config;
pub mod error;
