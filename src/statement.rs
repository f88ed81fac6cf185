#![forbid(unsafe_code)]

//! Statement synthesis.
//!
//! Every function here is pure: it renders statement text from descriptors
//! and scalar arguments and performs no I/O. Property values always pass
//! through the value encoder. Labels, relationship types, property keys and
//! index names are spliced as trusted identifiers, back-quoted only when they
//! are not plain identifiers.

use std::fmt::Write as _;

use crate::entity::{Edge, GraphEntity, Node};
use crate::error::{GraphError, Result};
use crate::value::{self, quote_identifier, quote_string, PropertyMap};

/// `SHOW INDEXES`.
pub const SHOW_INDEXES: &str = "SHOW INDEXES";
/// `SHOW UNIQUE CONSTRAINTS`.
pub const SHOW_UNIQUE_CONSTRAINTS: &str = "SHOW UNIQUE CONSTRAINTS";
/// Lists every node label, one `label` column per row.
pub const LIST_LABELS: &str = "CALL db.labels() YIELD label RETURN label";
/// Lists every relationship type, one `relationshipType` column per row.
pub const LIST_RELATIONSHIP_TYPES: &str =
    "CALL db.relationshipTypes() YIELD relationshipType RETURN relationshipType";
/// Node count per label.
pub const LABEL_COUNTS: &str =
    "MATCH (n) UNWIND labels(n) AS label RETURN label, count(*) AS count ORDER BY label";
/// Relationship count per type.
pub const RELATIONSHIP_TYPE_COUNTS: &str =
    "MATCH ()-[r]->() RETURN type(r) AS relationshipType, count(*) AS count ORDER BY relationshipType";
/// Running transactions.
pub const SHOW_TRANSACTIONS: &str =
    "SHOW TRANSACTIONS YIELD transactionId, currentQuery, database";
/// Deletes every relationship.
pub const DELETE_ALL_EDGES: &str = "MATCH ()-[r]->() DELETE r RETURN count(r) AS deleted";
/// Deletes every node together with its relationships.
pub const DELETE_ALL: &str = "MATCH (n) DETACH DELETE n RETURN count(n) AS deleted";

/// Column holding element ids returned by node create/merge.
pub const ID_COLUMN: &str = "id";
/// Column holding counts returned by count statements.
pub const COUNT_COLUMN: &str = "num";
/// Column holding counts returned by delete statements.
pub const DELETED_COLUMN: &str = "deleted";
/// Column holding counts returned by update statements.
pub const UPDATED_COLUMN: &str = "updated";

const RELATIONSHIP_RETURN: &str = "RETURN elementId(subject) AS subject_id, \
elementId(relation) AS edge_id, elementId(object) AS object_id";

fn where_clause<I>(predicates: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    let parts: Vec<String> = predicates.into_iter().flatten().collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn limit_clause(limit: Option<usize>) -> String {
    limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default()
}

fn element_id_predicate(alias: &str, id: &str) -> String {
    format!("elementId({alias}) = {}", quote_string(id))
}

fn require_name<'a>(what: &str, name: &'a str) -> Result<&'a str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(GraphError::InvalidArgument(format!("{what} must not be blank")))
    } else {
        Ok(trimmed)
    }
}

fn require_label(label: &str) -> Result<String> {
    Node::new(label).cypher_labels()
}

fn require_rel_type(rel_type: &str) -> Result<String> {
    Edge::new(rel_type).cypher_labels()
}

fn require_batch_size(size: usize) -> Result<usize> {
    if size == 0 {
        Err(GraphError::InvalidArgument(
            "transaction size must be at least one row".into(),
        ))
    } else {
        Ok(size)
    }
}

/// `CREATE (n:Labels {props}) RETURN elementId(n) AS id`.
pub fn create_node(node: &Node) -> Result<String> {
    Ok(format!(
        "CREATE ({}) RETURN elementId(n) AS {ID_COLUMN}",
        node.pattern("n")?
    ))
}

/// `MERGE (n:Labels {props}) RETURN elementId(n) AS id`.
///
/// A descriptor without properties merges on labels alone and reuses any
/// existing node carrying them.
pub fn merge_node(node: &Node) -> Result<String> {
    Ok(format!(
        "MERGE ({}) RETURN elementId(n) AS {ID_COLUMN}",
        node.pattern("n")?
    ))
}

/// Creates subject, edge and object in one `CREATE`.
pub fn create_edge(subject: &Node, edge: &Edge, object: &Node) -> Result<String> {
    Ok(format!(
        "CREATE ({})-[{}]->({})\n{RELATIONSHIP_RETURN}",
        subject.pattern("subject")?,
        edge.pattern("relation")?,
        object.pattern("object")?,
    ))
}

/// Merges subject and object independently, then merges the edge between them.
pub fn merge_edge(subject: &Node, edge: &Edge, object: &Node) -> Result<String> {
    Ok(format!(
        "MERGE ({})\nMERGE ({})\nMERGE (subject)-[{}]->(object)\n{RELATIONSHIP_RETURN}",
        subject.pattern("subject")?,
        object.pattern("object")?,
        edge.pattern("relation")?,
    ))
}

/// Creates an edge between every pair of existing matching subject/object nodes.
pub fn connect_existing(subject: &Node, edge: &Edge, object: &Node) -> Result<String> {
    let filter = where_clause([subject.get_where("subject"), object.get_where("object")]);
    Ok(format!(
        "MATCH (subject:{}), (object:{}){filter}\nCREATE (subject)-[{}]->(object)\n{RELATIONSHIP_RETURN}",
        subject.cypher_labels()?,
        object.cypher_labels()?,
        edge.pattern("relation")?,
    ))
}

/// `MATCH (n) RETURN n`, optionally limited.
pub fn all_nodes(limit: Option<usize>) -> String {
    format!("MATCH (n) RETURN n{}", limit_clause(limit))
}

/// Nodes matching the descriptor's labels and properties.
pub fn match_nodes(node: &Node, limit: Option<usize>) -> Result<String> {
    Ok(format!(
        "MATCH (n:{}){} RETURN n{}",
        node.cypher_labels()?,
        where_clause([node.get_where("n")]),
        limit_clause(limit)
    ))
}

/// Relationships matching the descriptor's type and properties.
pub fn match_edges(edge: &Edge, limit: Option<usize>) -> Result<String> {
    Ok(format!(
        "MATCH ()-[r:{}]->(){} RETURN r{}",
        edge.cypher_labels()?,
        where_clause([edge.get_where("r")]),
        limit_clause(limit)
    ))
}

/// Counts nodes, all of them when `node` is `None`.
pub fn count_nodes(node: Option<&Node>) -> Result<String> {
    let (labels, filter) = match node {
        Some(node) => (
            format!(":{}", node.cypher_labels()?),
            where_clause([node.get_where("n")]),
        ),
        None => (String::new(), String::new()),
    };
    Ok(format!(
        "MATCH (n{labels}){filter} RETURN count(n) AS {COUNT_COLUMN}"
    ))
}

/// Counts relationships, all of them when `edge` is `None`.
pub fn count_edges(edge: Option<&Edge>) -> Result<String> {
    let (rel_type, filter) = match edge {
        Some(edge) => (
            format!(":{}", edge.cypher_labels()?),
            where_clause([edge.get_where("e")]),
        ),
        None => (String::new(), String::new()),
    };
    Ok(format!(
        "MATCH ()-[e{rel_type}]->(){filter} RETURN count(e) AS {COUNT_COLUMN}"
    ))
}

/// Detach-deletes every node matching the descriptor.
pub fn delete_nodes(node: &Node) -> Result<String> {
    Ok(format!(
        "MATCH (n:{}){} DETACH DELETE n RETURN count(n) AS {DELETED_COLUMN}",
        node.cypher_labels()?,
        where_clause([node.get_where("n")])
    ))
}

/// Deletes every relationship matching the descriptor.
pub fn delete_edges(edge: &Edge) -> Result<String> {
    Ok(format!(
        "MATCH ()-[r:{}]->(){} DELETE r RETURN count(r) AS {DELETED_COLUMN}",
        edge.cypher_labels()?,
        where_clause([edge.get_where("r")])
    ))
}

/// Deletes matching nodes that have no incident relationship.
pub fn delete_nodes_without_edges(node: Option<&Node>) -> Result<String> {
    let isolated = Some("NOT (n)--()".to_string());
    let (labels, filter) = match node {
        Some(node) => (
            format!(":{}", node.cypher_labels()?),
            where_clause([isolated, node.get_where("n")]),
        ),
        None => (String::new(), where_clause([isolated])),
    };
    Ok(format!(
        "MATCH (n{labels}){filter} DELETE n RETURN count(n) AS {DELETED_COLUMN}"
    ))
}

/// Detach-deletes the node with element id `id`.
pub fn delete_node_by_id(id: &str) -> String {
    format!(
        "MATCH (n) WHERE {} DETACH DELETE n RETURN count(n) AS {DELETED_COLUMN}",
        element_id_predicate("n", id)
    )
}

/// Deletes the relationship with element id `id`.
pub fn delete_edge_by_id(id: &str) -> String {
    format!(
        "MATCH ()-[r]->() WHERE {} DELETE r RETURN count(r) AS {DELETED_COLUMN}",
        element_id_predicate("r", id)
    )
}

/// Deletes relationships in sub-transactions of `size` rows.
///
/// With a scope, only relationships incident to matching nodes are deleted.
pub fn batched_delete_edges(scope: Option<&Node>, size: usize) -> Result<String> {
    let size = require_batch_size(size)?;
    let source = match scope {
        Some(node) => format!(
            "MATCH (n:{})-[r]-(){} WITH DISTINCT r",
            node.cypher_labels()?,
            where_clause([node.get_where("n")])
        ),
        None => "MATCH ()-[r]->()".to_string(),
    };
    Ok(format!(
        "{source}\nCALL {{ WITH r DELETE r }} IN TRANSACTIONS OF {size} ROWS\nRETURN count(*) AS {DELETED_COLUMN}"
    ))
}

/// Detach-deletes nodes in sub-transactions of `size` rows.
pub fn batched_delete_nodes(scope: Option<&Node>, size: usize) -> Result<String> {
    let size = require_batch_size(size)?;
    let source = match scope {
        Some(node) => format!(
            "MATCH (n:{}){}",
            node.cypher_labels()?,
            where_clause([node.get_where("n")])
        ),
        None => "MATCH (n)".to_string(),
    };
    Ok(format!(
        "{source}\nCALL {{ WITH n DETACH DELETE n }} IN TRANSACTIONS OF {size} ROWS\nRETURN count(*) AS {DELETED_COLUMN}"
    ))
}

/// Adds `label` to every node matching the descriptor.
pub fn add_label(node: &Node, label: &str) -> Result<String> {
    Ok(format!(
        "MATCH (n:{}){} SET n:{} RETURN count(n) AS {UPDATED_COLUMN}",
        node.cypher_labels()?,
        where_clause([node.get_where("n")]),
        require_label(label)?
    ))
}

/// Removes `label` from the node with element id `id`.
pub fn remove_label(label: &str, id: &str) -> Result<String> {
    let label = require_label(label)?;
    Ok(format!(
        "MATCH (n:{label}) WHERE {} REMOVE n:{label} RETURN count(n) AS {UPDATED_COLUMN}",
        element_id_predicate("n", id)
    ))
}

/// Merges `props` into the properties of the node with element id `id`.
pub fn set_properties(id: &str, props: &PropertyMap) -> Result<String> {
    let clause = value::encode_props(props);
    if clause.is_empty() {
        return Err(GraphError::InvalidArgument(
            "no property value survives encoding".into(),
        ));
    }
    Ok(format!(
        "MATCH (n) WHERE {} SET n += {clause} RETURN count(n) AS {UPDATED_COLUMN}",
        element_id_predicate("n", id)
    ))
}

/// Removes property `prop` from the node with element id `id`.
pub fn remove_property_by_id(id: &str, prop: &str) -> Result<String> {
    let prop = quote_identifier(require_name("property name", prop)?);
    Ok(format!(
        "MATCH (n) WHERE {} REMOVE n.{prop} RETURN count(n) AS {UPDATED_COLUMN}",
        element_id_predicate("n", id)
    ))
}

/// Removes property `prop` from every node carrying `label`.
pub fn remove_property_by_label(label: &str, prop: &str) -> Result<String> {
    let prop = quote_identifier(require_name("property name", prop)?);
    Ok(format!(
        "MATCH (n:{}) REMOVE n.{prop} RETURN count(n) AS {UPDATED_COLUMN}",
        require_label(label)?
    ))
}

/// Removes every property from the node with element id `id`.
pub fn clear_properties_by_id(id: &str) -> String {
    format!(
        "MATCH (n) WHERE {} SET n = {{}} RETURN count(n) AS {UPDATED_COLUMN}",
        element_id_predicate("n", id)
    )
}

/// Removes every property from every node carrying `label`.
pub fn clear_properties_by_label(label: &str) -> Result<String> {
    Ok(format!(
        "MATCH (n:{}) SET n = {{}} RETURN count(n) AS {UPDATED_COLUMN}",
        require_label(label)?
    ))
}

/// `ix_<label>__<prop>`.
pub fn default_index_name(label: &str, prop: &str) -> String {
    format!("ix_{}__{}", label.trim(), prop.trim())
}

/// `uid_<label>__<prop>`.
pub fn default_constraint_name(label: &str, prop: &str) -> String {
    format!("uid_{}__{}", label.trim(), prop.trim())
}

fn resolve_name(explicit: Option<&str>, fallback: impl FnOnce() -> String) -> Result<String> {
    match explicit {
        Some(name) => Ok(quote_identifier(require_name("index name", name)?)),
        None => Ok(quote_identifier(&fallback())),
    }
}

/// Node property index, created only if absent.
pub fn create_node_index(label: &str, prop: &str, name: Option<&str>) -> Result<String> {
    let labels = require_label(label)?;
    let key = quote_identifier(require_name("property name", prop)?);
    let name = resolve_name(name, || default_index_name(label, prop))?;
    Ok(format!(
        "CREATE INDEX {name} IF NOT EXISTS FOR (n:{labels}) ON (n.{key})"
    ))
}

/// Relationship property index, created only if absent.
pub fn create_edge_index(rel_type: &str, prop: &str, name: Option<&str>) -> Result<String> {
    let rel = require_rel_type(rel_type)?;
    let key = quote_identifier(require_name("property name", prop)?);
    let name = resolve_name(name, || default_index_name(rel_type, prop))?;
    Ok(format!(
        "CREATE INDEX {name} IF NOT EXISTS FOR ()-[r:{rel}]-() ON (r.{key})"
    ))
}

/// Drops index `name` if it exists.
pub fn drop_index(name: &str) -> Result<String> {
    Ok(format!(
        "DROP INDEX {} IF EXISTS",
        quote_identifier(require_name("index name", name)?)
    ))
}

/// Uniqueness constraint on `(label, prop)`, created only if absent.
pub fn create_unique_constraint(label: &str, prop: &str, name: Option<&str>) -> Result<String> {
    let labels = require_label(label)?;
    let key = quote_identifier(require_name("property name", prop)?);
    let name = resolve_name(name, || default_constraint_name(label, prop))?;
    Ok(format!(
        "CREATE CONSTRAINT {name} IF NOT EXISTS FOR (n:{labels}) REQUIRE n.{key} IS UNIQUE"
    ))
}

/// Drops the uniqueness constraint on `(label, prop)` if it exists.
pub fn drop_unique_constraint(label: &str, prop: &str, name: Option<&str>) -> Result<String> {
    require_label(label)?;
    require_name("property name", prop)?;
    let name = resolve_name(name, || default_constraint_name(label, prop))?;
    Ok(format!("DROP CONSTRAINT {name} IF EXISTS"))
}

/// `TERMINATE TRANSACTIONS "id", ...`.
pub fn terminate_transactions<I, S>(ids: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ids: Vec<String> = ids.into_iter().map(|id| quote_string(id.as_ref())).collect();
    if ids.is_empty() {
        return Err(GraphError::InvalidArgument(
            "at least one transaction id is required".into(),
        ));
    }
    Ok(format!("TERMINATE TRANSACTIONS {}", ids.join(", ")))
}

/// Streams a staged CSV file into label-only or property-carrying nodes.
///
/// `file_name` is relative to the database import root. Each column in
/// `columns` becomes a lower-cased property bound to `line.<column>`;
/// `None` creates nodes without properties.
pub fn load_csv(
    label: &str,
    file_name: &str,
    columns: Option<&[String]>,
    field_terminator: char,
) -> Result<String> {
    let labels = require_label(label)?;
    let mut props = String::new();
    if let Some(columns) = columns.filter(|c| !c.is_empty()) {
        let bindings: Vec<String> = columns
            .iter()
            .map(|col| {
                format!(
                    "{}: line.{}",
                    quote_identifier(&col.to_lowercase()),
                    quote_identifier(col)
                )
            })
            .collect();
        let _ = write!(props, " {{{}}}", bindings.join(", "));
    }
    Ok(format!(
        "LOAD CSV WITH HEADERS FROM 'file:///{}'\nAS line FIELDTERMINATOR {}\nCREATE (:{labels}{props})",
        file_name.replace('\'', "\\'"),
        single_quoted(field_terminator)
    ))
}

fn single_quoted(ch: char) -> String {
    match ch {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\t' => "'\\t'".to_string(),
        c => format!("'{c}'"),
    }
}

/// One `CREATE` holding a pattern per row, all carrying `label`.
pub fn create_many(label: &str, rows: &[PropertyMap]) -> Result<String> {
    if rows.is_empty() {
        return Err(GraphError::InvalidArgument("no rows to create".into()));
    }
    let labels = require_label(label)?;
    let patterns: Vec<String> = rows
        .iter()
        .map(|row| {
            let props = value::encode_props(row);
            if props.is_empty() {
                format!("(:{labels})")
            } else {
                format!("(:{labels} {props})")
            }
        })
        .collect();
    Ok(format!("CREATE {}", patterns.join(", ")))
}
