//! Shared helpers for integration suites.
#![allow(dead_code)]

use std::path::Path;

use persona_hub::{DirectoryConfig, PersonaConfig};

/// Minimal valid persona document for `id`.
pub fn persona_yaml(id: &str, name: &str, role: &str) -> String {
    format!(
        r#"id: {id}
name: {name}
role: {role}
core:
  identity: Test identity for {id}
  primaryObjective: Test objective
  constraints:
    - Stay in scope
behavior:
  mindset:
    - Evidence first
  methodology:
    - Reproduce, then fix
  priorities:
    - Correctness
  antiPatterns:
    - Guessing
expertise:
  domains:
    - testing
  skills:
    - verification
decisionCriteria:
  - Is it reproducible?
"#
    )
}

pub fn write_persona(dir: &Path, file: &str, id: &str, name: &str) {
    std::fs::write(dir.join(file), persona_yaml(id, name, "Test role")).unwrap();
}

/// Config pointing at the given tempdir roots, watching disabled.
pub fn test_config(user: &Path, project: &Path) -> PersonaConfig {
    PersonaConfig {
        directories: DirectoryConfig {
            user: user.to_path_buf(),
            project: project.to_path_buf(),
        },
        ..PersonaConfig::default()
    }
}
