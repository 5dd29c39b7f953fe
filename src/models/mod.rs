pub mod loaders;
pub mod pagination;
pub mod record;
pub mod site;

pub use loaders::load_monitor_file;
pub use pagination::PaginationInfo;
pub use record::{Column, CrossRunKey, DetailRecord, ListRecord};
pub use site::{FirstPagePolicy, MonitorFile, PaginationOverride, SiteConfig};
