//! Remote and local layout of archive partitions
//!
//! - [`path`] - Mapping of (dataset, ticker, partition) to remote URL and local files
//! - [`calendar`] - Date range planning for monthly and daily partitions
//!
//! The local tree mirrors the remote suffix structure exactly:
//!
//! ```text
//! {root}/[futures/]{asset_class}/{granularity}/{data_type}/{ticker}/[{frequency}/]{ticker}-{tag}-{date}.csv
//! ```

pub mod calendar;
pub mod path;

pub use calendar::{first_of_month, plan};
pub use path::{RemoteResource, ResourceMapper};
