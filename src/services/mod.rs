pub mod deduplicator;
pub mod detail_extractor;
pub mod field_detector;
pub mod new_record_detector;
pub mod organizer_filter;
pub mod page_url_generator;
pub mod pagination_analyzer;
pub mod robots;
pub mod row_extractor;

pub use deduplicator::deduplicate;
pub use detail_extractor::{extract_detail, parse_date_range};
pub use field_detector::{detect_fields, DetectedFields, Field, FieldPatternTable};
pub use new_record_detector::detect_new_records;
pub use organizer_filter::filter_by_organizer;
pub use page_url_generator::generate_page_urls;
pub use pagination_analyzer::analyze_pagination;
pub use robots::RobotsRules;
pub use row_extractor::{ExtractionStats, RowExtractor};
