//! File-level tests: atomic write followed by strict and resilient reads.

use deptrace_jsonl::{Error, read_jsonl, read_jsonl_resilient, write_jsonl_atomic};
use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct NodeLike {
    identity: String,
    depth: usize,
    parents: Vec<String>,
}

#[fixture]
fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn sample() -> Vec<NodeLike> {
    vec![
        NodeLike {
            identity: "SRC:python27".to_string(),
            depth: 0,
            parents: vec![],
        },
        NodeLike {
            identity: "DEP:python(abi) = 2.7".to_string(),
            depth: 2,
            parents: vec!["BLT:python27".to_string()],
        },
    ]
}

#[rstest]
#[tokio::test]
async fn written_records_read_back_in_order(temp_dir: TempDir) {
    let path = temp_dir.path().join("graph.jsonl");
    write_jsonl_atomic(&path, &sample()).await.unwrap();

    let loaded: Vec<NodeLike> = read_jsonl(&path).await.unwrap();
    assert_eq!(loaded, sample());
}

#[rstest]
#[tokio::test]
async fn strict_read_fails_on_corrupted_line(temp_dir: TempDir) {
    let path = temp_dir.path().join("graph.jsonl");
    let mut content = String::new();
    content.push_str("{\"identity\":\"SRC:a\",\"depth\":0,\"parents\":[]}\n");
    content.push_str("{\"identity\":\"SRC:b\",\"depth\":\n");
    tokio::fs::write(&path, content).await.unwrap();

    let err = read_jsonl::<NodeLike, _>(&path).await.unwrap_err();
    assert!(matches!(err, Error::Parse { line_number: 2, .. }), "got {err:?}");
}

#[rstest]
#[tokio::test]
async fn resilient_read_skips_corrupted_line(temp_dir: TempDir) {
    let path = temp_dir.path().join("graph.jsonl");
    let mut content = String::new();
    content.push_str("{\"identity\":\"SRC:a\",\"depth\":0,\"parents\":[]}\n");
    content.push_str("garbage\n");
    content.push_str("{\"identity\":\"BLT:a\",\"depth\":1,\"parents\":[\"SRC:a\"]}\n");
    tokio::fs::write(&path, content).await.unwrap();

    let (records, warnings) = read_jsonl_resilient::<NodeLike, _>(&path).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].parents, vec!["SRC:a".to_string()]);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].line_number(), 2);
}

#[rstest]
#[tokio::test]
async fn missing_file_is_io_error(temp_dir: TempDir) {
    let path = temp_dir.path().join("absent.jsonl");
    let err = read_jsonl::<NodeLike, _>(&path).await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
