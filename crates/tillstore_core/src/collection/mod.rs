//! Collection store: CRUD with write-time deduplication.

mod dedup;
mod store;

pub use dedup::{count_duplicates, dedup_first_wins};
pub use store::Collection;
