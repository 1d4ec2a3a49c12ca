//! Query composition over the trip dataset: filter predicates, page windows
//! and the executor that runs both against the store.

pub mod executor;
pub mod pagination;
pub mod predicate;

pub use executor::{QueryExecutor, TripPage};
pub use pagination::{PageRequest, PaginationMeta, total_pages};
pub use predicate::{Comparison, Predicate, PredicateBuilder, TripColumn, TripFilter};
