//! External system integrations for strata.
//!
//! Adapters isolate the two external collaborators behind traits so
//! the core pipeline can be exercised against in-process fakes:
//!
//! - [`source`] - the database the changed documents are read from
//! - [`blob`] - the blob container every object is mirrored into
//!
//! # Design Pattern
//!
//! Both layers follow the adapter pattern: a trait owned by this crate
//! (`SourceCollection`/`ChangeCursor`, `BlobStore`) plus concrete
//! implementations that keep SDK and HTTP types out of the core.

pub mod blob;
pub mod source;
