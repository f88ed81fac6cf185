#![allow(missing_docs)]

mod common;

use common::ScriptedSession;
use cypher_tools::{Client, Edge, GraphError, Node, PropertyMap, LABEL_COLUMN};
use serde_json::json;

fn client(session: ScriptedSession) -> Client<ScriptedSession> {
    Client::new(session)
}

#[test]
fn create_node_returns_element_id() {
    let mut db = client(ScriptedSession::new().reply(json!([{"id": "4:abc:0"}])));
    let id = db
        .create_node(&Node::new("Person").with_prop("name", "Alice"))
        .unwrap();
    assert_eq!(id, "4:abc:0");
    assert_eq!(
        db.session_mut().statements,
        vec![r#"CREATE (n:Person {`name`: "Alice"}) RETURN elementId(n) AS id"#]
    );
}

#[test]
fn label_less_descriptor_never_dispatches() {
    let mut db = client(ScriptedSession::new());
    let blank = Node::with_labels(["", "  "]);
    assert!(matches!(
        db.create_node(&blank),
        Err(GraphError::MissingLabel { kind: "node" })
    ));
    assert!(db.delete_nodes(&blank).is_err());
    assert!(db
        .merge_edge(&Node::new("A"), &Edge::new("R"), &blank)
        .is_err());
    assert!(db
        .create_edge(&Node::new("A"), &Edge::new(""), &Node::new("B"))
        .is_err());
    assert!(db.session_mut().statements.is_empty());
}

#[test]
fn create_edge_returns_identifier_triple() {
    let mut db = client(ScriptedSession::new().reply(json!([{
        "subject_id": "4:x:1", "edge_id": "5:x:7", "object_id": "4:x:2"
    }])));
    let rel = db
        .create_edge(
            &Node::new("Person").with_prop("name", "Alice"),
            &Edge::new("KNOWS").with_prop("since", 2010),
            &Node::new("Person").with_prop("name", "Bob"),
        )
        .unwrap();
    assert_eq!(rel.subject, "4:x:1");
    assert_eq!(rel.edge, "5:x:7");
    assert_eq!(rel.object, "4:x:2");
    let stmt = &db.session_mut().statements[0];
    assert!(stmt.starts_with("CREATE (subject:Person"));
    assert!(stmt.contains("-[relation:KNOWS {`since`: 2010}]->"));
}

#[test]
fn connect_nodes_returns_one_relationship_per_row() {
    let mut db = client(ScriptedSession::new().reply(json!([
        {"subject_id": "a", "edge_id": "r1", "object_id": "b"},
        {"subject_id": "a", "edge_id": "r2", "object_id": "c"}
    ])));
    let rels = db
        .connect_nodes(&Node::new("Hub"), &Edge::new("LINKS"), &Node::new("Leaf"))
        .unwrap();
    assert_eq!(rels.len(), 2);
    assert_eq!(rels[1].object, "c");
}

#[test]
fn match_without_predicate_selects_whole_label() {
    let mut db = client(ScriptedSession::new().reply(json!([
        {"n": {"name": "Alice"}},
        {"n": {"name": "Bob"}}
    ])));
    let nodes = db.get_nodes(&Node::new("Person"), None).unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(db.session_mut().statements[0], "MATCH (n:Person) RETURN n");
}

#[test]
fn delete_family_reports_counts() {
    let mut db = client(
        ScriptedSession::new()
            .reply(json!([{"deleted": 3}]))
            .reply(json!([{"deleted": 2}]))
            .reply(json!([{"deleted": 0}])),
    );
    assert_eq!(db.delete_nodes(&Node::new("Temp")).unwrap(), 3);
    assert_eq!(db.delete_nodes_without_edges(Some(&Node::new("Tag"))).unwrap(), 2);
    assert_eq!(db.delete_edges(&Edge::new("OLD")).unwrap(), 0);
    let stmts = &db.session_mut().statements;
    assert!(stmts[0].contains("DETACH DELETE n"));
    assert!(stmts[1].contains("WHERE NOT (n)--()"));
    assert!(stmts[2].starts_with("MATCH ()-[r:OLD]->()"));
}

#[test]
fn mass_delete_runs_edge_pass_then_node_pass() {
    let mut db = client(
        ScriptedSession::new()
            .reply(json!([{"deleted": 40}]))
            .reply(json!([{"deleted": 250}])),
    );
    let report = db.delete_all_batched(None, 100).unwrap();
    assert_eq!(report.nodes_deleted, 250);
    assert_eq!(report.node_batches, 3);
    assert_eq!(report.edges_deleted, 40);
    assert_eq!(report.edge_batches, 1);

    let stmts = &db.session_mut().statements;
    assert_eq!(stmts.len(), 2);
    assert!(stmts[0].contains("CALL { WITH r DELETE r } IN TRANSACTIONS OF 100 ROWS"));
    assert!(stmts[1].contains("CALL { WITH n DETACH DELETE n } IN TRANSACTIONS OF 100 ROWS"));
}

#[test]
fn mass_delete_rejects_zero_size_before_dispatch() {
    let mut db = client(ScriptedSession::new());
    assert!(matches!(
        db.delete_all_batched(None, 0),
        Err(GraphError::InvalidArgument(_))
    ));
    assert!(db.session_mut().statements.is_empty());
}

#[test]
fn session_errors_propagate_unchanged() {
    let mut db = client(
        ScriptedSession::new().fail("Neo.ClientError.Schema.ConstraintValidationFailed"),
    );
    let err = db.merge_node(&Node::new("Person").with_prop("id", 1)).unwrap_err();
    match err {
        GraphError::Session(message) => {
            assert_eq!(message, "Neo.ClientError.Schema.ConstraintValidationFailed")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn ddl_is_repeatable_with_default_names() {
    let mut db = client(ScriptedSession::new());
    db.create_node_index("Person", "name", None).unwrap();
    db.create_node_index("Person", "name", None).unwrap();
    db.create_unique_constraint("Person", "id", None).unwrap();
    db.drop_unique_constraint("Person", "id", None).unwrap();
    let stmts = &db.session_mut().statements;
    assert_eq!(stmts[0], stmts[1]);
    assert!(stmts[0].contains("ix_Person__name IF NOT EXISTS"));
    assert!(stmts[2].contains("uid_Person__id IF NOT EXISTS"));
    assert_eq!(stmts[3], "DROP CONSTRAINT uid_Person__id IF EXISTS");
}

#[test]
fn introspection_lists_and_tables() {
    let mut db = client(
        ScriptedSession::new()
            .reply(json!([{"label": "City"}, {"label": "Person"}]))
            .reply(json!([{"relationshipType": "KNOWS"}]))
            .reply(json!([{"label": "City", "count": 2}, {"label": "Person", "count": 5}])),
    );
    assert_eq!(db.list_labels().unwrap(), vec!["City", "Person"]);
    assert_eq!(db.list_relationship_types().unwrap(), vec!["KNOWS"]);
    let counts = db.label_counts().unwrap();
    assert_eq!(counts[1]["count"], json!(5));
    assert!(!counts[0].contains_key(LABEL_COLUMN));
}

#[test]
fn exec_table_flattens_node_results() {
    let mut db = client(ScriptedSession::new().reply(json!([
        {"n": {"name": "Alice", "age": 30}}
    ])));
    let table = db.exec_table("MATCH (n:Person) RETURN n").unwrap();
    assert_eq!(
        serde_json::Value::Object(table[0].clone()),
        json!({"Label in Cypher": "n", "name": "Alice", "age": 30})
    );
}

#[test]
fn counts_and_property_updates() {
    let mut db = client(
        ScriptedSession::new()
            .reply(json!([{"num": 12}]))
            .reply(json!([{"updated": 1}])),
    );
    assert_eq!(db.count_nodes(None).unwrap(), 12);
    let mut props = PropertyMap::new();
    props.insert("age".into(), 31.into());
    assert_eq!(db.set_properties("4:x:1", &props).unwrap(), 1);
}

#[test]
fn close_releases_session() {
    let mut db = client(ScriptedSession::new());
    db.close().unwrap();
    assert!(db.session_mut().closed);
}

#[test]
fn maintenance_by_element_id() {
    let mut db = client(
        ScriptedSession::new()
            .reply(json!([{"updated": 1}]))
            .reply(json!([{"updated": 1}]))
            .reply(json!([{"updated": 1}]))
            .reply(json!([{"updated": 4}]))
            .reply(json!([{"deleted": 1}])),
    );
    assert_eq!(db.remove_label("Admin", "4:x:1").unwrap(), 1);
    assert_eq!(db.remove_property_by_id("4:x:1", "age").unwrap(), 1);
    assert_eq!(db.clear_properties_by_id("4:x:1").unwrap(), 1);
    assert_eq!(db.clear_properties_by_label("Temp").unwrap(), 4);
    assert_eq!(db.delete_edge_by_id("5:x:9").unwrap(), 1);

    let stmts = &db.session_mut().statements;
    assert_eq!(
        stmts[0],
        r#"MATCH (n:Admin) WHERE elementId(n) = "4:x:1" REMOVE n:Admin RETURN count(n) AS updated"#
    );
    assert_eq!(
        stmts[1],
        r#"MATCH (n) WHERE elementId(n) = "4:x:1" REMOVE n.age RETURN count(n) AS updated"#
    );
    assert_eq!(
        stmts[2],
        r#"MATCH (n) WHERE elementId(n) = "4:x:1" SET n = {} RETURN count(n) AS updated"#
    );
    assert_eq!(stmts[3], "MATCH (n:Temp) SET n = {} RETURN count(n) AS updated");
    assert_eq!(
        stmts[4],
        r#"MATCH ()-[r]->() WHERE elementId(r) = "5:x:9" DELETE r RETURN count(r) AS deleted"#
    );
}

#[test]
fn terminate_transactions_returns_status_table() {
    let mut db = client(ScriptedSession::new().reply(json!([
        {"transactionId": "neo4j-transaction-3", "message": "Transaction terminated."}
    ])));
    let table = db.terminate_transactions(["neo4j-transaction-3"]).unwrap();
    assert_eq!(table[0]["message"], json!("Transaction terminated."));
    assert_eq!(
        db.session_mut().statements[0],
        r#"TERMINATE TRANSACTIONS "neo4j-transaction-3""#
    );
    assert!(db.terminate_transactions(Vec::<String>::new()).is_err());
    assert_eq!(db.session_mut().statements.len(), 1);
}
