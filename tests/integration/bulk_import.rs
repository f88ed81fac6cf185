#![allow(missing_docs)]

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::ScriptedSession;
use cypher_tools::import::{self, STAGED_FILE_NAME};
use cypher_tools::{Client, ColumnSelection, GraphError, ImportOptions, PropertyMap};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    import_dir: PathBuf,
    csv: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let import_dir = dir.path().join("import");
    fs::create_dir(&import_dir).expect("import dir");
    let csv = dir.path().join("people.csv");
    fs::write(&csv, "a,b,c\n1,x,true\n2,y,false\n").expect("csv");
    Fixture {
        _dir: dir,
        import_dir,
        csv,
    }
}

fn load(fx: &Fixture, selection: ColumnSelection) -> (Option<Vec<String>>, String) {
    let mut db = Client::new(ScriptedSession::new()).with_import_folder(&fx.import_dir);
    let load = db
        .load_nodes_from_csv("Row", &fx.csv, &selection, ',')
        .expect("csv load");
    let stmt = db.session_mut().statements.pop().expect("one statement");
    (load.columns, stmt)
}

#[test]
fn staging_twice_replaces_previous_link() {
    let fx = fixture();
    let first = import::stage_csv(&fx.import_dir, &fx.csv).unwrap();
    let second = import::stage_csv(&fx.import_dir, &fx.csv).unwrap();
    assert_eq!(first, second);
    assert_eq!(second, fx.import_dir.join(STAGED_FILE_NAME));
    assert_eq!(fs::read_to_string(&second).unwrap(), fs::read_to_string(&fx.csv).unwrap());
    import::unstage(&fx.import_dir).unwrap();
    assert!(!second.exists());
    import::unstage(&fx.import_dir).unwrap();
}

#[cfg(unix)]
#[test]
fn staged_file_is_a_symlink_to_source() {
    let fx = fixture();
    let staged = import::stage_csv(&fx.import_dir, &fx.csv).unwrap();
    let target = fs::read_link(&staged).unwrap();
    assert_eq!(target, fs::canonicalize(&fx.csv).unwrap());
}

#[test]
fn staging_missing_source_is_file_not_found() {
    let fx = fixture();
    let missing = fx.import_dir.join("nope.csv");
    let err = import::stage_csv(&fx.import_dir, &missing).unwrap_err();
    assert!(matches!(err, GraphError::FileNotFound(path) if path == missing));
}

#[test]
fn staging_into_missing_import_dir_fails() {
    let fx = fixture();
    let err = import::stage_csv(Path::new("/definitely/not/here"), &fx.csv).unwrap_err();
    assert!(matches!(err, GraphError::FileNotFound(_)));
}

#[test]
fn empty_selection_imports_every_column() {
    let fx = fixture();
    let (cols, stmt) = load(&fx, ColumnSelection::from(Some(vec![])));
    assert_eq!(cols.unwrap(), vec!["a", "b", "c"]);
    assert!(stmt.ends_with("CREATE (:Row {a: line.a, b: line.b, c: line.c})"));
    assert!(stmt.starts_with("LOAD CSV WITH HEADERS FROM 'file:///import_file.csv'"));
}

#[test]
fn explicit_selection_drops_unknown_columns() {
    let fx = fixture();
    let (cols, stmt) = load(
        &fx,
        ColumnSelection::from(Some(vec!["a".to_string(), "z".to_string()])),
    );
    assert_eq!(cols.unwrap(), vec!["a"]);
    assert!(stmt.ends_with("CREATE (:Row {a: line.a})"));
}

#[test]
fn no_selection_imports_label_only_nodes() {
    let fx = fixture();
    let (cols, stmt) = load(&fx, ColumnSelection::from(None));
    assert!(cols.is_none());
    assert!(stmt.ends_with("CREATE (:Row)"));
}

#[test]
fn csv_load_of_missing_file_dispatches_nothing() {
    let fx = fixture();
    let mut db = Client::new(ScriptedSession::new()).with_import_folder(&fx.import_dir);
    let err = db
        .load_nodes_from_csv("Row", &fx.import_dir.join("gone.csv"), &ColumnSelection::All, ',')
        .unwrap_err();
    assert!(matches!(err, GraphError::FileNotFound(_)));
    assert!(db.session_mut().statements.is_empty());
}

fn rows(n: i64) -> Vec<PropertyMap> {
    (0..n)
        .map(|i| {
            let mut row = PropertyMap::new();
            row.insert("i".into(), i.into());
            row
        })
        .collect()
}

#[test]
fn rows_are_created_in_chunks() {
    let mut db = Client::new(ScriptedSession::new());
    let opts = ImportOptions {
        chunk_size: 1000,
        ..Default::default()
    };
    let summary = db.import_rows("Item", rows(2500), &opts).unwrap();
    assert_eq!(summary.rows, 2500);
    assert_eq!(summary.statements, 3);
    let stmts = &db.session_mut().statements;
    assert_eq!(stmts[2].matches("(:Item").count(), 500);
    assert!(stmts[0].starts_with("CREATE (:Item {`i`: 0}), (:Item {`i`: 1})"));
}

#[test]
fn merge_mode_sends_one_statement_per_row() {
    let mut db = Client::new(ScriptedSession::new());
    let opts = ImportOptions {
        chunk_size: 2,
        merge: true,
        ..Default::default()
    };
    let summary = db.import_rows("Item", rows(3), &opts).unwrap();
    assert_eq!(summary.statements, 3);
    assert!(db.session_mut().statements[1].starts_with("MERGE (n:Item {`i`: 1})"));
}

#[test]
fn csv_rows_are_ingested_with_inferred_types() {
    let fx = fixture();
    let mut db = Client::new(ScriptedSession::new());
    let summary = db
        .import_csv_rows("Row", &fx.csv, ',', &ImportOptions::default())
        .unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(
        db.session_mut().statements[0],
        r#"CREATE (:Row {`a`: 1, `b`: "x", `c`: true}), (:Row {`a`: 2, `b`: "y", `c`: false})"#
    );
}
