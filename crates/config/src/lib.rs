// Configuration loading

pub mod settings;

pub use settings::{AiSettings, Settings, SortPreference};
