pub mod query;
pub mod store;
pub mod title;

pub use query::{normalize_limit, normalize_page, Criteria, PageResult, Pagination};
pub use store::{Catalog, CatalogError};
pub use title::Title;
