mod cluster;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod reconcile;
pub mod similarity;

pub use engine::{Bucketing, MergeConfig, MergeEngine, DEFAULT_MATCH_THRESHOLD};
pub use error::MergeError;
pub use normalize::{normalize, NormalizedKey};
pub use reconcile::reconcile;
pub use similarity::score;
