//! Filesystem capability contracts, exercised through the registry the way
//! the reasoning service reaches them.

use std::fs;

use serde_json::json;
use site_crew::tools::{CapabilityOutcome, CapabilityRegistry};

fn invoke(registry: &CapabilityRegistry, name: &str, args: serde_json::Value) -> CapabilityOutcome {
    registry
        .get(name)
        .unwrap_or_else(|| panic!("{name} is registered"))
        .invoke(&args)
}

// ---------------------------------------------------------------------------
// write_text / read_text
// ---------------------------------------------------------------------------

#[test]
fn test_write_then_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    let body = "<!doctype html>\n<h1>Ada, portfolio</h1>\n";
    let written = invoke(&registry, "write_text", json!({"path": "site/index.html", "content": body}));
    let CapabilityOutcome::Text(message) = written else {
        panic!("write failed: {written:?}");
    };
    assert!(message.starts_with("Wrote file: "));
    assert!(message.contains(&format!("({} bytes)", body.len())));

    let read = invoke(&registry, "read_text", json!({"path": "site/index.html"}));
    assert_eq!(read, CapabilityOutcome::Text(body.to_string()));
}

#[test]
fn test_empty_content_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    invoke(&registry, "write_text", json!({"path": "empty.txt", "content": ""}));
    assert_eq!(
        invoke(&registry, "read_text", json!({"path": "empty.txt"})),
        CapabilityOutcome::Text(String::new())
    );

    // Missing content also writes an empty file.
    invoke(&registry, "write_text", json!({"path": "none.txt"}));
    assert_eq!(fs::read_to_string(dir.path().join("none.txt")).unwrap(), "");
}

#[test]
fn test_write_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    invoke(&registry, "write_text", json!({"path": "a.txt", "content": "first version"}));
    invoke(&registry, "write_text", json!({"path": "a.txt", "content": "second"}));
    assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "second");
}

#[test]
fn test_read_missing_file_is_error_text() {
    let dir = tempfile::tempdir().unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    let outcome = invoke(&registry, "read_text", json!({"path": "nope.txt"}));
    assert!(outcome.is_error());
    let wire = outcome.to_wire();
    assert!(wire.as_str().unwrap().starts_with("ERROR reading file 'nope.txt'"));
}

#[test]
fn test_read_latin1() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("l1.txt"), [b'c', b'a', b'f', 0xE9]).unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    assert_eq!(
        invoke(&registry, "read_text", json!({"path": "l1.txt", "encoding": "latin-1"})),
        CapabilityOutcome::Text("café".to_string())
    );
    assert!(invoke(&registry, "read_text", json!({"path": "l1.txt"})).is_error());
}

// ---------------------------------------------------------------------------
// create_directory / append_text
// ---------------------------------------------------------------------------

#[test]
fn test_create_directory_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    let first = invoke(&registry, "create_directory", json!({"path": "website/css"}));
    let second = invoke(&registry, "create_directory", json!({"path": "website/css"}));
    assert!(!first.is_error());
    assert!(!second.is_error());
    assert!(dir.path().join("website/css").is_dir());
}

#[test]
fn test_append_accumulates() {
    let dir = tempfile::tempdir().unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    invoke(&registry, "append_text", json!({"path": "log/notes.txt", "content": "a"}));
    invoke(&registry, "append_text", json!({"path": "log/notes.txt", "content": "b"}));
    assert_eq!(
        invoke(&registry, "read_text", json!({"path": "log/notes.txt"})),
        CapabilityOutcome::Text("ab".to_string())
    );
}

// ---------------------------------------------------------------------------
// path_exists / list_entries / contains_substring
// ---------------------------------------------------------------------------

#[test]
fn test_contains_substring_contract() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<title>Portfolio</title>").unwrap();
    fs::create_dir(dir.path().join("css")).unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    let check = |path: &str, text: &str| {
        invoke(&registry, "contains_substring", json!({"path": path, "text": text}))
    };
    assert_eq!(check("index.html", "Portfolio"), CapabilityOutcome::Flag(true));
    assert_eq!(check("index.html", "Resume"), CapabilityOutcome::Flag(false));
    assert_eq!(check("index.html", ""), CapabilityOutcome::Flag(true));
    assert_eq!(check("missing.html", "x"), CapabilityOutcome::Flag(false));
    assert_eq!(check("css", "x"), CapabilityOutcome::Flag(false));
}

#[test]
fn test_contains_substring_undecodable_file_answers_false() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("logo.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    let outcome = invoke(&registry, "contains_substring", json!({"path": "logo.bin", "text": "x"}));
    assert!(outcome.is_error());
    assert_eq!(outcome.to_wire(), serde_json::Value::Bool(false));
}

#[test]
fn test_list_entries_sorted() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["script.js", "index.html", "css"] {
        fs::write(dir.path().join(name), "").unwrap();
    }
    let registry = CapabilityRegistry::standard(dir.path());

    assert_eq!(
        invoke(&registry, "list_entries", json!({"path": "."})),
        CapabilityOutcome::Entries(vec![
            "css".to_string(),
            "index.html".to_string(),
            "script.js".to_string(),
        ])
    );

    let missing = invoke(&registry, "list_entries", json!({"path": "nowhere"}));
    let wire = missing.to_wire();
    let entries = wire.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].as_str().unwrap().starts_with("ERROR"));
}

#[test]
fn test_path_exists() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "").unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    assert_eq!(invoke(&registry, "path_exists", json!({"path": "a.txt"})), CapabilityOutcome::Flag(true));
    assert_eq!(invoke(&registry, "path_exists", json!({"path": "b.txt"})), CapabilityOutcome::Flag(false));
}

#[test]
fn test_malformed_arguments_are_values() {
    let dir = tempfile::tempdir().unwrap();
    let registry = CapabilityRegistry::standard(dir.path());

    for name in registry.names() {
        let outcome = invoke(&registry, name, json!({"path": 42}));
        assert!(outcome.is_error(), "{name} accepted a numeric path");
    }
}

#[test]
fn test_every_capability_publishes_an_object_schema() {
    let registry = CapabilityRegistry::standard("/tmp");
    assert_eq!(registry.len(), 7);
    for name in registry.names() {
        let schema = registry.get(name).unwrap().parameters();
        assert_eq!(schema["type"], "object", "{name}");
        assert!(schema["properties"]["path"].is_object(), "{name}");
    }
}
