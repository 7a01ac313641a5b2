//! Listing API: page model and the cursor-following paginator.
//!
//! The listing is a chain of JSON pages linked by `metadata.next_url`.
//! Each page carries a batch of [`Record`]s, every one naming a file to
//! download and the `index` used as its local filename.

mod error;
mod model;
mod paginator;

pub use error::PaginateError;
pub use model::{Page, PageMetadata, Record};
pub use paginator::Paginator;
