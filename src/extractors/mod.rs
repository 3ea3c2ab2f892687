pub mod challenge;
pub mod douyin;
pub mod identifier;
pub mod images;
pub mod js_interpreter;
pub mod video;

pub use challenge::ChallengeSolver;
pub use douyin::DouyinExtractor;
pub use identifier::IdentifierResolver;
pub use images::ImageLocator;
pub use video::VideoLocator;
