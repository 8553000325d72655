//! Source collection adapters
//!
//! [`traits::SourceCollection`] and [`traits::ChangeCursor`] define
//! the seam the pipeline queries through; [`cosmos::CosmosSource`] is
//! the Cosmos DB implementation.

pub mod cosmos;
pub mod traits;

pub use cosmos::CosmosSource;
pub use traits::{ChangeCursor, SourceCollection};
