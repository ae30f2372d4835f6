pub mod csv_tables;

pub use csv_tables::{load_catalog, load_ratings, read_catalog, read_ratings};
