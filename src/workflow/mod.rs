pub mod detail_flow;
pub mod listing_flow;
pub mod site_ctx;

pub use detail_flow::DetailFlow;
pub use listing_flow::ListingFlow;
pub use site_ctx::SiteCtx;
