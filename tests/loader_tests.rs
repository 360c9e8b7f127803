mod common;

use std::path::PathBuf;

use tempfile::TempDir;

use common::{persona_yaml, write_persona};
use persona_hub::{LoadBudget, PersonaLoader, ResourceLimits, SourceTier};

fn loader() -> PersonaLoader {
    PersonaLoader::default()
}

#[tokio::test]
async fn valid_file_loads_with_source_metadata() {
    let dir = TempDir::new().unwrap();
    write_persona(dir.path(), "navigator.yaml", "navigator", "Navigator");

    let loaded = loader()
        .load_one(
            &dir.path().join("navigator.yaml"),
            SourceTier::User,
            Some(dir.path()),
            None,
        )
        .await;

    assert!(loaded.is_valid, "errors: {:?}", loaded.validation_errors);
    assert!(loaded.validation_errors.is_empty());
    assert_eq!(loaded.persona.id, "navigator");
    assert_eq!(loaded.persona.name, "Navigator");
    assert_eq!(loaded.source.tier, SourceTier::User);
    assert!(loaded.source.file_path.is_some());
    assert!(loaded.source.last_modified.is_some());
}

#[tokio::test]
async fn size_limit_is_exact() {
    let dir = TempDir::new().unwrap();
    let content = persona_yaml("edge", "Edge", "Boundary case");
    let path = dir.path().join("edge.yaml");
    std::fs::write(&path, &content).unwrap();
    let size = content.len() as u64;

    let at_limit = loader()
        .load_one(&path, SourceTier::User, None, Some(size))
        .await;
    assert!(at_limit.is_valid);

    let over_limit = loader()
        .load_one(&path, SourceTier::User, None, Some(size - 1))
        .await;
    assert!(!over_limit.is_valid);
    assert!(
        over_limit
            .validation_errors
            .iter()
            .any(|e| e.contains("Resource limit"))
    );
}

#[tokio::test]
async fn traversal_attempt_is_rejected_before_read() {
    let base = TempDir::new().unwrap();
    let traversal = base.path().join("../../etc/passwd.yaml");

    let loaded = loader()
        .load_one(&traversal, SourceTier::User, Some(base.path()), None)
        .await;

    assert!(!loaded.is_valid);
    assert!(
        loaded
            .validation_errors
            .iter()
            .any(|e| e.contains("Security violation")),
        "errors: {:?}",
        loaded.validation_errors
    );
    // Guard rejection precedes any metadata or content access, so no source
    // timestamp was collected.
    assert!(loaded.source.last_modified.is_none());
}

#[tokio::test]
async fn disallowed_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not yaml").unwrap();

    let loaded = loader().load_one(&path, SourceTier::User, None, None).await;
    assert!(!loaded.is_valid);
    assert!(
        loaded
            .validation_errors
            .iter()
            .any(|e| e.contains("disallowed extension"))
    );
}

#[tokio::test]
async fn broken_document_yields_invalid_record_with_derived_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken-one.yaml");
    std::fs::write(&path, "id: [unclosed").unwrap();

    let loaded = loader().load_one(&path, SourceTier::Project, None, None).await;
    assert!(!loaded.is_valid);
    assert!(loaded.validation_errors[0].contains("Parse error"));
    assert_eq!(loaded.persona.id, "broken-one");
    assert_eq!(loaded.source.tier, SourceTier::Project);
}

#[tokio::test]
async fn shape_errors_name_the_offending_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gappy.yaml");
    std::fs::write(&path, "id: gappy\nname: G\nrole: r\n").unwrap();

    let loaded = loader().load_one(&path, SourceTier::User, None, None).await;
    assert!(!loaded.is_valid);
    assert!(
        loaded
            .validation_errors
            .iter()
            .all(|e| e.contains("Schema validation failed") && e.contains("gappy.yaml"))
    );
}

#[tokio::test]
async fn discover_truncates_to_max_files() {
    let dir = TempDir::new().unwrap();
    for i in 0..8 {
        write_persona(dir.path(), &format!("p{i}.yaml"), &format!("p{i}"), "P");
    }

    let found = loader().discover(dir.path(), Some(3)).await;
    assert_eq!(found.len(), 3);

    let all = loader().discover(dir.path(), None).await;
    assert_eq!(all.len(), 8);
}

#[tokio::test]
async fn discover_skips_excluded_and_non_persona_files() {
    let dir = TempDir::new().unwrap();
    write_persona(dir.path(), "keep.yaml", "keep", "Keep");
    std::fs::write(dir.path().join("readme.md"), "not a persona").unwrap();

    let vcs = dir.path().join(".git");
    std::fs::create_dir(&vcs).unwrap();
    write_persona(&vcs, "hidden.yaml", "hidden", "Hidden");

    let deps = dir.path().join("node_modules");
    std::fs::create_dir(&deps).unwrap();
    write_persona(&deps, "dep.yaml", "dep", "Dep");

    let found = loader().discover(dir.path(), None).await;
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("keep.yaml"));
}

#[tokio::test]
async fn discover_missing_directory_is_empty_not_error() {
    let found = loader()
        .discover(&PathBuf::from("/no/such/persona/dir"), None)
        .await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn load_directory_respects_remaining_budget() {
    let limits = ResourceLimits::default();
    let loader = PersonaLoader::new(limits);

    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    for i in 0..2 {
        write_persona(first.path(), &format!("a{i}.yaml"), &format!("a{i}"), "A");
        write_persona(second.path(), &format!("b{i}.yaml"), &format!("b{i}"), "B");
    }

    let budget = LoadBudget::new(3);
    let (from_first, budget) = loader
        .load_directory(first.path(), SourceTier::User, budget)
        .await;
    assert_eq!(from_first.len(), 2);
    assert_eq!(budget.remaining(), 1);

    let (from_second, budget) = loader
        .load_directory(second.path(), SourceTier::Project, budget)
        .await;
    assert_eq!(from_second.len(), 1);
    assert!(budget.is_exhausted());

    let (nothing, budget) = loader
        .load_directory(second.path(), SourceTier::Project, budget)
        .await;
    assert!(nothing.is_empty());
    assert!(budget.is_exhausted());
}

#[tokio::test]
async fn validity_invariant_holds_for_every_outcome() {
    let dir = TempDir::new().unwrap();
    write_persona(dir.path(), "good.yaml", "good", "Good");
    std::fs::write(dir.path().join("bad.yaml"), "role: only").unwrap();

    let (records, _) = loader()
        .load_directory(dir.path(), SourceTier::User, LoadBudget::new(10))
        .await;
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.is_valid, record.validation_errors.is_empty());
    }
    assert_eq!(records.iter().filter(|r| r.is_valid).count(), 1);
}
