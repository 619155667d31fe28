//! Linear-hashing index layer: two paged files per index (a primary-bucket
//! file and an overflow file), addressed by `calc_bucket(key)` and grown one
//! bucket at a time via controlled splits.

pub mod datapage;
pub mod keyvalue;
pub mod manager;
pub mod metadata;
pub mod scan;

pub use datapage::{DataPage, PageType};
pub use keyvalue::KeyValue;
pub use manager::HashIndex;
pub use metadata::MetadataPage;
pub use scan::IndexScan;
