//! The registry must behave the same whichever store backs it, so every
//! check here runs once per backend.

use std::collections::HashSet;
use std::sync::Arc;

use modelhub::registry::{
    ArtifactFile, ErrorKind, FsStore, MemoryStore, ModelRegistry, ModelStore,
};
use serde_json::json;
use tempfile::TempDir;

/// Keeps the temporary directory alive as long as the registry.
struct Fixture {
    registry: ModelRegistry,
    _dir: Option<TempDir>,
}

fn memory() -> Fixture {
    Fixture {
        registry: ModelRegistry::new(Arc::new(MemoryStore::new())),
        _dir: None,
    }
}

fn filesystem() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn ModelStore> = Arc::new(FsStore::open(dir.path().join("models")).unwrap());
    Fixture {
        registry: ModelRegistry::new(store),
        _dir: Some(dir),
    }
}

fn backends() -> Vec<(&'static str, Fixture)> {
    vec![("memory", memory()), ("filesystem", filesystem())]
}

#[test]
fn create_returns_unique_non_empty_ids() {
    for (backend, fx) in backends() {
        let mut seen = HashSet::new();
        for i in 0..20 {
            let record = fx.registry.create(&format!("model {}", i)).unwrap();
            assert!(!record.id.is_empty(), "{}", backend);
            assert!(seen.insert(record.id), "{}: duplicate id", backend);
        }
    }
}

#[test]
fn create_rejects_empty_name() {
    for (backend, fx) in backends() {
        for name in ["", "   "] {
            let err = fx.registry.create(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{}", backend);
        }
        assert!(fx.registry.list().unwrap().is_empty(), "{}", backend);
    }
}

#[test]
fn new_record_starts_empty() {
    for (backend, fx) in backends() {
        let created = fx.registry.create("demo").unwrap();
        let loaded = fx.registry.get(&created.id).unwrap();

        assert_eq!(loaded.id, created.id, "{}", backend);
        assert_eq!(loaded.name, "demo", "{}", backend);
        assert!(loaded.captures.is_empty(), "{}", backend);
        assert!(loaded.file_names.is_empty(), "{}", backend);
    }
}

#[test]
fn get_unknown_id_is_not_found() {
    for (backend, fx) in backends() {
        for id in ["does-not-exist", "3f1c9b8e-2f4a-4d8e-9a61-0c5b7e2d1a90", "../etc"] {
            let err = fx.registry.get(id).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound, "{}: {}", backend, id);
        }
    }
}

#[test]
fn attach_captures_to_unknown_id_is_not_found() {
    for (backend, fx) in backends() {
        let err = fx
            .registry
            .attach_captures("3f1c9b8e-2f4a-4d8e-9a61-0c5b7e2d1a90", vec![json!({"x": 1})])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{}", backend);
        assert!(fx.registry.list().unwrap().is_empty(), "{}: record created implicitly", backend);
    }
}

#[test]
fn attach_captures_requires_id() {
    for (backend, fx) in backends() {
        let err = fx.registry.attach_captures("", vec![json!(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{}", backend);
    }
}

#[test]
fn attach_captures_replaces_previous_set() {
    for (backend, fx) in backends() {
        let record = fx.registry.create("demo").unwrap();
        fx.registry
            .attach_captures(&record.id, vec![json!("a"), json!("b"), json!("c")])
            .unwrap();
        fx.registry.attach_captures(&record.id, vec![json!("x")]).unwrap();

        let loaded = fx.registry.get(&record.id).unwrap();
        assert_eq!(loaded.captures, vec![json!("x")], "{}", backend);
    }
}

#[test]
fn attach_captures_updates_timestamp() {
    for (backend, fx) in backends() {
        let record = fx.registry.create("demo").unwrap();
        fx.registry.attach_captures(&record.id, vec![json!(1)]).unwrap();

        let loaded = fx.registry.get(&record.id).unwrap();
        assert_eq!(loaded.created_at, record.created_at, "{}", backend);
        assert!(loaded.updated_at >= record.updated_at, "{}", backend);
    }
}

#[test]
fn attach_files_records_names_and_content() {
    for (backend, fx) in backends() {
        let record = fx.registry.create("demo").unwrap();
        let stored = fx
            .registry
            .attach_files(
                &record.id,
                vec![
                    ArtifactFile::new("model.json", br#"{"modelTopology":{}}"#.to_vec()),
                    ArtifactFile::new("model.weights.bin", vec![0u8, 1, 2, 3]),
                ],
            )
            .unwrap();

        assert_eq!(stored, vec!["model.json", "model.weights.bin"], "{}", backend);

        let loaded = fx.registry.get(&record.id).unwrap();
        assert!(loaded.file_names.contains(&"model.json".to_string()), "{}", backend);
        assert_eq!(
            fx.registry.read_file(&record.id, "model.weights.bin").unwrap(),
            vec![0u8, 1, 2, 3],
            "{}",
            backend
        );
    }
}

#[test]
fn repeated_upload_duplicates_name_but_keeps_latest_content() {
    for (backend, fx) in backends() {
        let record = fx.registry.create("demo").unwrap();
        fx.registry
            .attach_files(&record.id, vec![ArtifactFile::new("model.json", b"v1".to_vec())])
            .unwrap();
        fx.registry
            .attach_files(&record.id, vec![ArtifactFile::new("model.json", b"v2".to_vec())])
            .unwrap();

        let loaded = fx.registry.get(&record.id).unwrap();
        assert_eq!(loaded.file_names, vec!["model.json", "model.json"], "{}", backend);
        assert_eq!(fx.registry.read_file(&record.id, "model.json").unwrap(), b"v2", "{}", backend);
    }
}

#[test]
fn attach_files_to_unknown_id_is_not_found() {
    for (backend, fx) in backends() {
        let err = fx
            .registry
            .attach_files("missing", vec![ArtifactFile::new("model.json", b"{}".to_vec())])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{}", backend);
    }
}

#[test]
fn attach_files_rejects_unsafe_names_without_storing_anything() {
    for (backend, fx) in backends() {
        let record = fx.registry.create("demo").unwrap();
        let err = fx
            .registry
            .attach_files(
                &record.id,
                vec![
                    ArtifactFile::new("ok.bin", b"ok".to_vec()),
                    ArtifactFile::new("../escape.bin", b"bad".to_vec()),
                ],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{}", backend);

        let loaded = fx.registry.get(&record.id).unwrap();
        assert!(loaded.file_names.is_empty(), "{}", backend);
        assert_eq!(
            fx.registry.read_file(&record.id, "ok.bin").unwrap_err().kind(),
            ErrorKind::NotFound,
            "{}",
            backend
        );
    }
}

#[test]
fn read_missing_file_is_not_found() {
    for (backend, fx) in backends() {
        let record = fx.registry.create("demo").unwrap();
        let err = fx.registry.read_file(&record.id, "nothing.bin").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{}", backend);
    }
}

#[test]
fn list_returns_all_records_in_creation_order() {
    for (backend, fx) in backends() {
        let a = fx.registry.create("A").unwrap();
        let b = fx.registry.create("B").unwrap();

        let listed = fx.registry.list().unwrap();
        assert_eq!(listed.len(), 2, "{}", backend);
        assert_eq!((listed[0].id.as_str(), listed[0].name.as_str()), (a.id.as_str(), "A"), "{}", backend);
        assert_eq!((listed[1].id.as_str(), listed[1].name.as_str()), (b.id.as_str(), "B"), "{}", backend);
    }
}

#[test]
fn every_field_round_trips() {
    for (backend, fx) in backends() {
        let captures = vec![
            json!({"label": "cat", "pixels": [12, 250, 3]}),
            json!(null),
            json!("raw"),
        ];
        let record = fx.registry.create("Clasificador de gestos").unwrap();
        fx.registry.attach_captures(&record.id, captures.clone()).unwrap();
        fx.registry
            .attach_files(&record.id, vec![ArtifactFile::new("weights.bin", vec![9u8; 64])])
            .unwrap();

        let got = fx.registry.get(&record.id).unwrap();
        let listed = fx.registry.list().unwrap();

        assert_eq!(got.name, "Clasificador de gestos", "{}", backend);
        assert_eq!(got.captures, captures, "{}", backend);
        assert_eq!(got.file_names, vec!["weights.bin"], "{}", backend);
        assert_eq!(listed, vec![got], "{}", backend);
    }
}

#[test]
fn demo_scenario() {
    for (backend, fx) in backends() {
        let record = fx.registry.create("demo").unwrap();
        fx.registry.attach_captures(&record.id, vec![json!({"x": 1})]).unwrap();

        let got = fx.registry.get(&record.id).unwrap();
        assert_eq!(got.id, record.id, "{}", backend);
        assert_eq!(got.name, "demo", "{}", backend);
        assert_eq!(got.captures, vec![json!({"x": 1})], "{}", backend);
        assert!(got.file_names.is_empty(), "{}", backend);
    }
}

#[test]
fn concurrent_capture_saves_on_one_id_all_succeed() {
    for (backend, fx) in backends() {
        let record = fx.registry.create("busy").unwrap();
        let small = vec![json!(1)];
        let large: Vec<_> = (0..50).map(|i| json!({ "sample": i })).collect();

        std::thread::scope(|scope| {
            for t in 0..8 {
                let registry = &fx.registry;
                let id = record.id.as_str();
                let payload = if t % 2 == 0 { small.clone() } else { large.clone() };
                scope.spawn(move || {
                    for _ in 0..50 {
                        registry.attach_captures(id, payload.clone()).unwrap();
                    }
                });
            }
        });

        // last write wins, but whatever won must be one complete payload
        let loaded = fx.registry.get(&record.id).unwrap();
        assert!(loaded.captures == small || loaded.captures == large, "{}", backend);
        assert_eq!(loaded.name, "busy", "{}", backend);
        assert_eq!(fx.registry.list().unwrap().len(), 1, "{}", backend);
    }
}
