//! Layered configuration: merge heterogeneous sources into one tree,
//! substitute, and decode typed values on demand.
//!
//! A [`Gestalt`] is assembled by the [`builder::GestaltBuilder`] from a
//! list of sources. [`Gestalt::load_configs`] asks each source for its
//! contribution, merges the fragments in source order (later sources
//! win), runs the post-processors (string substitution, secret
//! wrapping), and publishes the result as an immutable generation.
//! Typed reads navigate the tree, decode through the priority-ordered
//! decoder registry, and are memoized until the next reload.
//!
//! ```
//! use gestalt::builder::GestaltBuilder;
//! use gestalt::source::MapSource;
//!
//! # fn main() -> Result<(), gestalt::GestaltError> {
//! let gestalt = GestaltBuilder::new()
//!     .add_source(MapSource::new("defaults", [
//!         ("db.port", "5432"),
//!         ("db.hosts", "a.internal, b.internal"),
//!     ]))
//!     .add_source(MapSource::new("overrides", [("db.port", "6432")]))
//!     .build()?;
//! gestalt.load_configs()?;
//!
//! let port: u16 = gestalt.get_config("db.port")?;
//! let hosts: Vec<String> = gestalt.get_config("db.hosts")?;
//! assert_eq!(port, 6432);
//! assert_eq!(hosts.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod builder;
mod cache;
pub mod config;
mod core;
pub mod decoder;
mod error;
mod gestalt;
pub mod lexer;
pub mod loader;
pub mod meta;
pub mod node;
pub mod path;
pub mod processor;
pub mod reflect;
pub mod reload;
pub mod secret;
pub mod source;
pub mod tag;
pub mod token;
mod validated;

pub use crate::config::GestaltConfig;
pub use crate::core::GestaltCore;
pub use crate::error::{ErrorList, GestaltError, ValidationError, ValidationLevel};
pub use crate::gestalt::Gestalt;
pub use crate::reflect::{ConfigType, TypeInfo};
pub use crate::validated::Validated;
