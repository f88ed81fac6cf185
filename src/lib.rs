//! Client-side toolkit for property-graph databases.
//!
//! Typed node and edge descriptors are rendered into statement text, run
//! through a [`GraphSession`], and their results normalized into flat
//! records. Bulk helpers cover batched deletes, CSV loads through the
//! server's import directory, chunked row ingestion and schema DDL.
//!
//! ```
//! use cypher_tools::{statement, Node};
//!
//! let alice = Node::new("Person").with_prop("name", "Alice").with_prop("age", 30);
//! assert_eq!(
//!     statement::merge_node(&alice).unwrap(),
//!     r#"MERGE (n:Person {`age`: 30, `name`: "Alice"}) RETURN elementId(n) AS id"#
//! );
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod entity;
pub mod error;
pub mod import;
pub mod mapper;
pub mod profile;
pub mod session;
pub mod statement;
pub mod value;

pub use client::{Client, MassDeleteReport};
pub use entity::{Edge, GraphEntity, Node, Relationship};
pub use error::{GraphError, Result};
pub use import::{ColumnSelection, ImportOptions, ImportSummary};
pub use mapper::{NormalizedRecord, LABEL_COLUMN};
pub use profile::{ConnectionProfile, ProfileError, ProfileUpdate};
pub use session::{GraphSession, RawRecord};
pub use value::{PropertyMap, PropertyValue};
