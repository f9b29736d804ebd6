//! Messages, category labels and the tables they are stored in.

pub mod dataset;
pub mod labels;
pub mod loader;
pub mod message;
pub mod prepare;

pub use dataset::{Dataset, k_fold_indices};
pub use labels::{CategorySet, LabelMatrix};
pub use loader::{load_dataset, save_dataset};
pub use message::Message;
pub use prepare::{CleanSummary, RawCorpus, clean, load_raw};
