pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod utils;

pub use crate::core::{ContentIdentifier, ContentKind, ExtractorEngine, MediaKind, ParseResult, ResolveError};
pub use crate::extractors::DouyinExtractor;
