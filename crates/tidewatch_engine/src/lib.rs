//! Tidewatch engine: queries, content adapters, persistence and the reaction
//! execution cycle.
mod action;
mod content;
mod decode;
mod engine;
mod error;
mod fetch;
mod file_query;
mod filters;
mod persist;
mod query;
mod reaction;
mod runner;
mod store;
mod types;

pub use action::{Action, ActionError, DirectoryAction, LogAction, StdoutAction};
pub use content::{
    Comic, Content, Episode, FileStatus, HourForecast, HtmlPage, HttpDocument, Strip,
    TorrentFile, WeatherSnapshot, WindDirection,
};
pub use decode::{decode_body, DecodeError, DecodedText};
pub use engine::Engine;
pub use error::ConfigurationError;
pub use fetch::{FetchSettings, FollowQuery, HttpQuery};
pub use file_query::FileQuery;
pub use filters::{
    BlacklistFilter, ComicSiteFilter, EpisodeFilter, ExtractUrlFilter, HtmlFilter,
    SizeBlacklistFilter, TorrentSelectors, TorrentSiteFilter, WeatherJsonFilter,
    DEFAULT_EPISODE_PATTERNS,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use query::{FallbackQuery, Query};
pub use reaction::Reaction;
pub use runner::{ReactionRunner, RunError};
pub use store::{state_key, JsonFileStore, MemoryStore, StateStore, StoreError, StoredState};
pub use types::{CycleOutcome, CycleReport, FailureKind, FetchError, Stage};
