// Queries over the code index

pub mod engine;

pub use engine::{QueryEngine, QueryResult};
