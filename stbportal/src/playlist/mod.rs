pub mod cache;
pub mod catalog;
pub mod parser;
pub mod source;
pub mod types;

pub use cache::CatalogCache;
pub use catalog::{Catalog, PAGE_SIZE};
pub use source::open_source;
pub use types::ChannelRecord;
