#![forbid(unsafe_code)]

//! Node and edge descriptors used to build statements.
//!
//! A descriptor is not a database row: it carries a label set and an
//! optional property map, renders the clauses a statement needs, and is
//! thrown away afterwards. Nothing derived from it is cached.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{GraphError, Result};
use crate::value::{self, PropertyMap, PropertyValue};

/// Separator between labels in a label clause.
pub const LABEL_SEPARATOR: char = ':';

/// Capability set shared by [`Node`] and [`Edge`].
pub trait GraphEntity {
    /// Descriptor kind, used in error messages.
    const KIND: &'static str;

    /// Raw label set (untrimmed).
    fn labels(&self) -> &BTreeSet<String>;

    /// Property constraints; `None` means unconstrained.
    fn properties(&self) -> Option<&PropertyMap>;

    /// Labels trimmed, blanks dropped and joined with [`LABEL_SEPARATOR`].
    ///
    /// Fails with [`GraphError::MissingLabel`] when no label survives, so a
    /// statement can never silently match every entity.
    fn cypher_labels(&self) -> Result<String> {
        let cleaned: BTreeSet<&str> = self
            .labels()
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        if cleaned.is_empty() {
            return Err(GraphError::MissingLabel { kind: Self::KIND });
        }
        let parts: Vec<String> = cleaned.into_iter().map(value::quote_identifier).collect();
        Ok(parts.join(&LABEL_SEPARATOR.to_string()))
    }

    /// Property clause, empty when no property is retained by the encoder.
    fn cypher_props(&self) -> String {
        self.properties().map(value::encode_props).unwrap_or_default()
    }

    /// Equality predicate over every retained property, bound to `alias`.
    ///
    /// `None` means "no predicate": all entities carrying the labels match.
    fn get_where(&self, alias: &str) -> Option<String> {
        let props = self.properties()?;
        let clauses: Vec<String> = value::encoded_entries(props)
            .into_iter()
            .map(|(k, lit)| format!("{alias}.{} = {lit}", value::quote_identifier(k)))
            .collect();
        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    /// `alias:Labels {props}` as used inside `(...)` or `[...]`.
    fn pattern(&self, alias: &str) -> Result<String> {
        let labels = self.cypher_labels()?;
        let props = self.cypher_props();
        Ok(if props.is_empty() {
            format!("{alias}:{labels}")
        } else {
            format!("{alias}:{labels} {props}")
        })
    }

    /// Properties the encoder keeps, for a parameter-binding renderer.
    fn bound_properties(&self) -> PropertyMap {
        self.properties().map(value::retained).unwrap_or_default()
    }
}

/// Node descriptor with one or more labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    labels: BTreeSet<String>,
    properties: Option<PropertyMap>,
}

impl Node {
    /// Descriptor with a single label and no properties.
    pub fn new(label: impl Into<String>) -> Self {
        let label: String = label.into();
        Self::with_labels([label])
    }

    /// Descriptor carrying every label in `labels`.
    pub fn with_labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            properties: None,
        }
    }

    /// Replaces the property map.
    pub fn with_props(mut self, props: PropertyMap) -> Self {
        self.properties = Some(props);
        self
    }

    /// Adds or replaces a single property.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties
            .get_or_insert_with(PropertyMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl GraphEntity for Node {
    const KIND: &'static str = "node";

    fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    fn properties(&self) -> Option<&PropertyMap> {
        self.properties.as_ref()
    }
}

/// Edge descriptor with exactly one relationship type.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    rel_type: BTreeSet<String>,
    properties: Option<PropertyMap>,
}

impl Edge {
    /// Descriptor for relationship type `rel_type`.
    pub fn new(rel_type: impl Into<String>) -> Self {
        Self {
            rel_type: BTreeSet::from([rel_type.into()]),
            properties: None,
        }
    }

    /// Replaces the property map.
    pub fn with_props(mut self, props: PropertyMap) -> Self {
        self.properties = Some(props);
        self
    }

    /// Adds or replaces a single property.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties
            .get_or_insert_with(PropertyMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// The relationship type as given.
    pub fn rel_type(&self) -> &str {
        self.rel_type.iter().next().map(String::as_str).unwrap_or("")
    }
}

impl GraphEntity for Edge {
    const KIND: &'static str = "edge";

    fn labels(&self) -> &BTreeSet<String> {
        &self.rel_type
    }

    fn properties(&self) -> Option<&PropertyMap> {
        self.properties.as_ref()
    }
}

macro_rules! impl_display {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let labels: Vec<&str> = self.labels().iter().map(String::as_str).collect();
                write!(f, "<{}: {}>", labels.join(":"), self.cypher_props())
            }
        }
    };
}

impl_display!(Node);
impl_display!(Edge);

/// Element identifiers of a created or merged `(subject)-[edge]->(object)`.
///
/// Identifiers are only meaningful within one database instance and must not
/// be persisted across structural rewrites of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relationship {
    /// Element id of the start node.
    pub subject: String,
    /// Element id of the relationship.
    pub edge: String,
    /// Element id of the end node.
    pub object: String,
}
