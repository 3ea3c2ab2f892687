pub mod error;
pub mod extractor;
pub mod fetch;
pub mod media;

pub use error::ResolveError;
pub use extractor::{ExtractorEngine, MediaExtractor};
pub use fetch::{Fetcher, ReqwestFetcher};
pub use media::{ContentIdentifier, ContentKind, FetchResult, Identity, MediaKind, ParseResult};
