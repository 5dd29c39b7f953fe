pub mod page_fetcher;
pub mod record_store;

pub use page_fetcher::{HttpPageFetcher, PageFetcher};
pub use record_store::{JsonTableStore, RecordStore, SaveSummary, StoreStats};
