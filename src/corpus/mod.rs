pub mod label;
pub mod loader;
pub mod reference_corpus;
pub mod store;

pub use label::Label;
pub use loader::{count_images, list_images, load_corpus, ClassReport, CorpusLoad, CorpusSource, LoadReport, SkippedFile};
pub use reference_corpus::ReferenceCorpus;
pub use store::CorpusStore;
