pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod llms_txt;
pub mod metrics;
pub mod overview;
pub mod profile_url;
pub mod raiderio;
pub mod roster;
pub mod warband;
pub mod warcraftlogs;
