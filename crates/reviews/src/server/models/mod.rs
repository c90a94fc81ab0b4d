pub mod review;
pub mod topic;

pub use review::{Review, ReviewCorpus};
pub use topic::{Topic, UnknownTopic};
