pub mod activity;
pub mod config;
pub mod credential;
pub mod guard;
pub mod presets;
pub mod settings;
pub mod store;
pub mod types;
pub mod wizard;
