#![forbid(unsafe_code)]

//! High-level client: synthesize a statement, dispatch it once, map the result.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::entity::{Edge, GraphEntity, Node, Relationship};
use crate::error::{GraphError, Result};
use crate::import::{self, ColumnSelection, CsvLoad, CsvRowSource, ImportOptions, ImportSummary};
use crate::mapper::{self, NormalizedRecord};
use crate::profile::ConnectionProfile;
use crate::session::{GraphSession, RawRecord};
use crate::statement::{self, COUNT_COLUMN, DELETED_COLUMN, ID_COLUMN, UPDATED_COLUMN};
use crate::value::{self, PropertyMap};

/// Counts reported by [`Client::delete_all_batched`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MassDeleteReport {
    /// Relationships removed by the edge pass.
    pub edges_deleted: u64,
    /// Nodes removed by the node pass.
    pub nodes_deleted: u64,
    /// Sub-transactions committed by the edge pass.
    pub edge_batches: u64,
    /// Sub-transactions committed by the node pass.
    pub node_batches: u64,
}

/// Client bound to one session.
///
/// All operations are synchronous and run one after another on the same
/// session; nothing is retried.
pub struct Client<S: GraphSession> {
    session: S,
    profile: Option<ConnectionProfile>,
    import_folder: Option<PathBuf>,
}

impl<S: GraphSession> Client<S> {
    /// Wraps an already opened session.
    pub fn new(session: S) -> Self {
        Self {
            session,
            profile: None,
            import_folder: None,
        }
    }

    /// Wraps a session opened from `profile`; the import folder comes from the profile.
    pub fn with_profile(session: S, profile: ConnectionProfile) -> Self {
        Self {
            session,
            import_folder: profile.import_folder.clone(),
            profile: Some(profile),
        }
    }

    /// Overrides the import folder used for CSV staging.
    pub fn with_import_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.import_folder = Some(folder.into());
        self
    }

    /// Profile this client was built from, if any.
    pub fn profile(&self) -> Option<&ConnectionProfile> {
        self.profile.as_ref()
    }

    /// Import folder used for CSV staging, if configured.
    pub fn import_folder(&self) -> Option<&Path> {
        self.import_folder.as_deref()
    }

    /// Underlying session.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Runs raw statement text and returns the rows unchanged.
    pub fn exec_data(&mut self, statement: &str) -> Result<Vec<RawRecord>> {
        debug!(statement, "dispatching statement");
        let records = self.session.run(statement)?;
        debug!(rows = records.len(), "statement finished");
        Ok(mapper::to_records(records))
    }

    /// Runs raw statement text and normalizes the rows into a table.
    pub fn exec_table(&mut self, statement: &str) -> Result<Vec<NormalizedRecord>> {
        self.exec_data(statement).map(mapper::to_table)
    }

    /// Closes the session.
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    /// `SHOW INDEXES` as a table.
    pub fn show_indexes(&mut self) -> Result<Vec<NormalizedRecord>> {
        self.exec_table(statement::SHOW_INDEXES)
    }

    /// `SHOW UNIQUE CONSTRAINTS` as a table.
    pub fn show_unique_constraints(&mut self) -> Result<Vec<NormalizedRecord>> {
        self.exec_table(statement::SHOW_UNIQUE_CONSTRAINTS)
    }

    /// Every node label.
    pub fn list_labels(&mut self) -> Result<Vec<String>> {
        let records = self.exec_data(statement::LIST_LABELS)?;
        string_values(&records, "label")
    }

    /// Every relationship type.
    pub fn list_relationship_types(&mut self) -> Result<Vec<String>> {
        let records = self.exec_data(statement::LIST_RELATIONSHIP_TYPES)?;
        string_values(&records, "relationshipType")
    }

    /// Node count per label.
    pub fn label_counts(&mut self) -> Result<Vec<NormalizedRecord>> {
        self.exec_table(statement::LABEL_COUNTS)
    }

    /// Relationship count per type.
    pub fn relationship_type_counts(&mut self) -> Result<Vec<NormalizedRecord>> {
        self.exec_table(statement::RELATIONSHIP_TYPE_COUNTS)
    }

    /// Running transactions.
    pub fn show_transactions(&mut self) -> Result<Vec<NormalizedRecord>> {
        self.exec_table(statement::SHOW_TRANSACTIONS)
    }

    /// Terminates the given transactions; returns the server's status table.
    pub fn terminate_transactions<I, T>(&mut self, ids: I) -> Result<Vec<NormalizedRecord>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let stmt = statement::terminate_transactions(ids)?;
        self.exec_table(&stmt)
    }

    /// Property maps of all nodes.
    pub fn nodes(&mut self, limit: Option<usize>) -> Result<Vec<Map<String, Value>>> {
        let records = self.exec_data(&statement::all_nodes(limit))?;
        map_values(&records, "n")
    }

    /// Property maps of nodes matching `node`.
    pub fn get_nodes(
        &mut self,
        node: &Node,
        limit: Option<usize>,
    ) -> Result<Vec<Map<String, Value>>> {
        let records = self.exec_data(&statement::match_nodes(node, limit)?)?;
        map_values(&records, "n")
    }

    /// Property maps of relationships matching `edge`.
    pub fn get_edges(
        &mut self,
        edge: &Edge,
        limit: Option<usize>,
    ) -> Result<Vec<Map<String, Value>>> {
        let records = self.exec_data(&statement::match_edges(edge, limit)?)?;
        map_values(&records, "r")
    }

    /// Number of nodes matching `node`, or of all nodes.
    pub fn count_nodes(&mut self, node: Option<&Node>) -> Result<u64> {
        let records = self.exec_data(&statement::count_nodes(node)?)?;
        count_value(&records, COUNT_COLUMN)
    }

    /// Number of relationships matching `edge`, or of all relationships.
    pub fn count_edges(&mut self, edge: Option<&Edge>) -> Result<u64> {
        let records = self.exec_data(&statement::count_edges(edge)?)?;
        count_value(&records, COUNT_COLUMN)
    }

    /// Creates a node and returns its element id.
    pub fn create_node(&mut self, node: &Node) -> Result<String> {
        let records = self.exec_data(&statement::create_node(node)?)?;
        string_value(&records, ID_COLUMN)
    }

    /// Merges a node and returns the element id of the reused or created node.
    pub fn merge_node(&mut self, node: &Node) -> Result<String> {
        let records = self.exec_data(&statement::merge_node(node)?)?;
        string_value(&records, ID_COLUMN)
    }

    /// Creates subject, edge and object together.
    pub fn create_edge(
        &mut self,
        subject: &Node,
        edge: &Edge,
        object: &Node,
    ) -> Result<Relationship> {
        let records = self.exec_data(&statement::create_edge(subject, edge, object)?)?;
        first_relationship(&records)
    }

    /// Merges subject, object and the edge between them.
    pub fn merge_edge(
        &mut self,
        subject: &Node,
        edge: &Edge,
        object: &Node,
    ) -> Result<Relationship> {
        let records = self.exec_data(&statement::merge_edge(subject, edge, object)?)?;
        first_relationship(&records)
    }

    /// Creates an edge between existing matching nodes; one entry per pair.
    pub fn connect_nodes(
        &mut self,
        subject: &Node,
        edge: &Edge,
        object: &Node,
    ) -> Result<Vec<Relationship>> {
        let records = self.exec_data(&statement::connect_existing(subject, edge, object)?)?;
        records.iter().map(relationship).collect()
    }

    /// Adds `label` to matching nodes; returns how many were updated.
    pub fn add_label(&mut self, node: &Node, label: &str) -> Result<u64> {
        self.updated(&statement::add_label(node, label)?)
    }

    /// Removes `label` from one node.
    pub fn remove_label(&mut self, label: &str, id: &str) -> Result<u64> {
        self.updated(&statement::remove_label(label, id)?)
    }

    /// Merges `props` into one node's properties.
    pub fn set_properties(&mut self, id: &str, props: &PropertyMap) -> Result<u64> {
        self.updated(&statement::set_properties(id, props)?)
    }

    /// Removes one property from one node.
    pub fn remove_property_by_id(&mut self, id: &str, prop: &str) -> Result<u64> {
        self.updated(&statement::remove_property_by_id(id, prop)?)
    }

    /// Removes one property from every node with `label`.
    pub fn remove_property_by_label(&mut self, label: &str, prop: &str) -> Result<u64> {
        self.updated(&statement::remove_property_by_label(label, prop)?)
    }

    /// Removes all properties from one node.
    pub fn clear_properties_by_id(&mut self, id: &str) -> Result<u64> {
        self.updated(&statement::clear_properties_by_id(id))
    }

    /// Removes all properties from every node with `label`.
    pub fn clear_properties_by_label(&mut self, label: &str) -> Result<u64> {
        self.updated(&statement::clear_properties_by_label(label)?)
    }

    /// Detach-deletes matching nodes; returns how many were deleted.
    pub fn delete_nodes(&mut self, node: &Node) -> Result<u64> {
        self.deleted(&statement::delete_nodes(node)?)
    }

    /// Deletes matching relationships.
    pub fn delete_edges(&mut self, edge: &Edge) -> Result<u64> {
        self.deleted(&statement::delete_edges(edge)?)
    }

    /// Deletes every relationship in one transaction.
    pub fn delete_all_edges(&mut self) -> Result<u64> {
        self.deleted(statement::DELETE_ALL_EDGES)
    }

    /// Deletes every node and relationship in one transaction.
    pub fn delete_all(&mut self) -> Result<u64> {
        self.deleted(statement::DELETE_ALL)
    }

    /// Deletes matching nodes that have no relationships.
    pub fn delete_nodes_without_edges(&mut self, node: Option<&Node>) -> Result<u64> {
        self.deleted(&statement::delete_nodes_without_edges(node)?)
    }

    /// Detach-deletes one node.
    pub fn delete_node_by_id(&mut self, id: &str) -> Result<u64> {
        self.deleted(&statement::delete_node_by_id(id))
    }

    /// Deletes one relationship.
    pub fn delete_edge_by_id(&mut self, id: &str) -> Result<u64> {
        self.deleted(&statement::delete_edge_by_id(id))
    }

    /// Deletes relationships, then nodes, in sub-transactions of `transaction_size` rows.
    ///
    /// `scope` restricts both passes to nodes matching the descriptor and the
    /// relationships incident to them; `None` empties the graph.
    pub fn delete_all_batched(
        &mut self,
        scope: Option<&Node>,
        transaction_size: usize,
    ) -> Result<MassDeleteReport> {
        let edge_stmt = statement::batched_delete_edges(scope, transaction_size)?;
        let node_stmt = statement::batched_delete_nodes(scope, transaction_size)?;
        let size = transaction_size as u64;

        let edges_deleted = self.deleted(&edge_stmt)?;
        let nodes_deleted = self.deleted(&node_stmt)?;
        let report = MassDeleteReport {
            edges_deleted,
            nodes_deleted,
            edge_batches: edges_deleted.div_ceil(size),
            node_batches: nodes_deleted.div_ceil(size),
        };
        info!(
            edges = report.edges_deleted,
            nodes = report.nodes_deleted,
            transaction_size,
            "batched delete finished"
        );
        Ok(report)
    }

    /// Creates a node index, default name `ix_<label>__<prop>`.
    pub fn create_node_index(&mut self, label: &str, prop: &str, name: Option<&str>) -> Result<()> {
        self.exec_data(&statement::create_node_index(label, prop, name)?)
            .map(drop)
    }

    /// Creates a relationship index, default name `ix_<type>__<prop>`.
    pub fn create_edge_index(
        &mut self,
        rel_type: &str,
        prop: &str,
        name: Option<&str>,
    ) -> Result<()> {
        self.exec_data(&statement::create_edge_index(rel_type, prop, name)?)
            .map(drop)
    }

    /// Drops an index if it exists.
    pub fn drop_index(&mut self, name: &str) -> Result<()> {
        self.exec_data(&statement::drop_index(name)?).map(drop)
    }

    /// Creates a uniqueness constraint, default name `uid_<label>__<prop>`.
    pub fn create_unique_constraint(
        &mut self,
        label: &str,
        prop: &str,
        name: Option<&str>,
    ) -> Result<()> {
        self.exec_data(&statement::create_unique_constraint(label, prop, name)?)
            .map(drop)
    }

    /// Drops a uniqueness constraint if it exists.
    pub fn drop_unique_constraint(
        &mut self,
        label: &str,
        prop: &str,
        name: Option<&str>,
    ) -> Result<()> {
        self.exec_data(&statement::drop_unique_constraint(label, prop, name)?)
            .map(drop)
    }

    /// Stages `source` in the import folder and loads it as `label` nodes.
    ///
    /// The staged link is left in place; call [`import::unstage`] once the
    /// load is no longer needed.
    pub fn load_nodes_from_csv(
        &mut self,
        label: &str,
        source: &Path,
        columns: &ColumnSelection,
        field_terminator: char,
    ) -> Result<CsvLoad> {
        let folder = self.import_folder.clone().ok_or_else(|| {
            GraphError::InvalidArgument("no import folder configured for CSV staging".into())
        })?;
        let header = import::read_header(source, field_terminator)?;
        let columns = columns.resolve(&header);
        let stmt = statement::load_csv(
            label,
            import::STAGED_FILE_NAME,
            columns.as_deref(),
            field_terminator,
        )?;
        let staged = import::stage_csv(&folder, source)?;
        self.exec_data(&stmt)?;
        info!(
            label,
            source = %source.display(),
            columns = columns.as_ref().map_or(0, Vec::len),
            "CSV load finished"
        );
        Ok(CsvLoad { staged, columns })
    }

    /// Ingests `rows` as `label` nodes in chunks.
    pub fn import_rows<I>(
        &mut self,
        label: &str,
        rows: I,
        options: &ImportOptions,
    ) -> Result<ImportSummary>
    where
        I: IntoIterator<Item = PropertyMap>,
    {
        self.import_row_results(label, rows.into_iter().map(Ok), options)
    }

    /// Ingests every row of a CSV file as `label` nodes in chunks.
    pub fn import_csv_rows(
        &mut self,
        label: &str,
        path: &Path,
        field_terminator: char,
        options: &ImportOptions,
    ) -> Result<ImportSummary> {
        let source = CsvRowSource::open(path, field_terminator)?;
        self.import_row_results(label, source, options)
    }

    fn import_row_results<I>(
        &mut self,
        label: &str,
        rows: I,
        options: &ImportOptions,
    ) -> Result<ImportSummary>
    where
        I: Iterator<Item = Result<PropertyMap>>,
    {
        if options.chunk_size == 0 {
            return Err(GraphError::InvalidArgument(
                "chunk size must be at least one row".into(),
            ));
        }
        Node::new(label).pattern("n")?;

        let bar = progress_bar(options.progress);
        let mut summary = ImportSummary::default();
        let mut chunk: Vec<PropertyMap> = Vec::with_capacity(options.chunk_size);
        for row in rows {
            let row = row?;
            if options.normalize_keys {
                chunk.push(
                    row.into_iter()
                        .map(|(k, v)| (value::standard_name(&k), v))
                        .collect(),
                );
            } else {
                chunk.push(row);
            }
            if chunk.len() >= options.chunk_size {
                self.flush_chunk(label, &mut chunk, options.merge, &mut summary)?;
                bar.set_position(summary.rows);
            }
        }
        self.flush_chunk(label, &mut chunk, options.merge, &mut summary)?;
        bar.finish_and_clear();
        info!(
            label,
            rows = summary.rows,
            statements = summary.statements,
            "row import finished"
        );
        Ok(summary)
    }

    fn flush_chunk(
        &mut self,
        label: &str,
        chunk: &mut Vec<PropertyMap>,
        merge: bool,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        if merge {
            for row in chunk.drain(..) {
                let node = Node::new(label).with_props(row);
                self.exec_data(&statement::merge_node(&node)?)?;
                summary.rows += 1;
                summary.statements += 1;
            }
        } else {
            self.exec_data(&statement::create_many(label, chunk)?)?;
            summary.rows += chunk.len() as u64;
            summary.statements += 1;
            chunk.clear();
        }
        Ok(())
    }

    fn deleted(&mut self, stmt: &str) -> Result<u64> {
        let records = self.exec_data(stmt)?;
        count_value(&records, DELETED_COLUMN)
    }

    fn updated(&mut self, stmt: &str) -> Result<u64> {
        let records = self.exec_data(stmt)?;
        count_value(&records, UPDATED_COLUMN)
    }
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {pos} rows imported ({elapsed})") {
        bar.set_style(style);
    }
    bar
}

fn first_column<'a>(records: &'a [RawRecord], column: &str) -> Result<&'a Value> {
    records
        .first()
        .and_then(|r| r.get(column))
        .ok_or_else(|| GraphError::unexpected(format!("missing column '{column}'")))
}

fn count_value(records: &[RawRecord], column: &str) -> Result<u64> {
    let value = first_column(records, column)?;
    value
        .as_u64()
        .ok_or_else(|| GraphError::unexpected(format!("column '{column}' is not a count: {value}")))
}

fn string_value(records: &[RawRecord], column: &str) -> Result<String> {
    as_string(first_column(records, column)?, column)
}

fn as_string(value: &Value, column: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(GraphError::unexpected(format!(
            "column '{column}' is not an identifier: {other}"
        ))),
    }
}

fn string_values(records: &[RawRecord], column: &str) -> Result<Vec<String>> {
    records
        .iter()
        .map(|r| {
            r.get(column)
                .ok_or_else(|| GraphError::unexpected(format!("missing column '{column}'")))
                .and_then(|v| as_string(v, column))
        })
        .collect()
}

fn map_values(records: &[RawRecord], column: &str) -> Result<Vec<Map<String, Value>>> {
    records
        .iter()
        .map(|r| match r.get(column) {
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(GraphError::unexpected(format!(
                "column '{column}' is not an entity: {other}"
            ))),
            None => Err(GraphError::unexpected(format!("missing column '{column}'"))),
        })
        .collect()
}

fn relationship(record: &RawRecord) -> Result<Relationship> {
    let field = |column: &str| {
        record
            .get(column)
            .ok_or_else(|| GraphError::unexpected(format!("missing column '{column}'")))
            .and_then(|v| as_string(v, column))
    };
    Ok(Relationship {
        subject: field("subject_id")?,
        edge: field("edge_id")?,
        object: field("object_id")?,
    })
}

fn first_relationship(records: &[RawRecord]) -> Result<Relationship> {
    records
        .first()
        .ok_or_else(|| GraphError::unexpected("edge statement returned no row"))
        .and_then(relationship)
}
