//! Path guard: containment validation and filename hygiene.
//!
//! Every file the loader touches passes through `validate_path` first. The
//! guard fails closed: any path that cannot be fully canonicalized is
//! rejected rather than partially checked.

use std::path::{Path, PathBuf};

use crate::error::{PersonaError, Result};

/// Validate that `candidate` resolves to a location inside `base_dir`.
///
/// Both paths are canonicalized (symlinks resolved, `..` collapsed), so
/// traversal and symlink escapes are caught structurally rather than
/// textually. Relative candidates are interpreted against `base_dir`.
///
/// # Errors
///
/// Returns `PersonaError::Security` for NUL bytes, canonicalization failures
/// (including nonexistent paths), and results outside `base_dir`.
pub async fn validate_path(candidate: &Path, base_dir: &Path) -> Result<PathBuf> {
    if contains_nul(candidate) {
        return Err(PersonaError::Security(format!(
            "path contains NUL byte: {}",
            candidate.display()
        )));
    }

    let canonical_base = tokio::fs::canonicalize(base_dir).await.map_err(|e| {
        PersonaError::Security(format!(
            "base directory {} is not resolvable: {e}",
            base_dir.display()
        ))
    })?;

    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        canonical_base.join(candidate)
    };

    let canonical = tokio::fs::canonicalize(&joined).await.map_err(|e| {
        PersonaError::Security(format!(
            "path {} is not resolvable: {e}",
            candidate.display()
        ))
    })?;

    if !canonical.starts_with(&canonical_base) {
        return Err(PersonaError::Security(format!(
            "path {} escapes base directory {}",
            candidate.display(),
            canonical_base.display()
        )));
    }

    Ok(canonical)
}

/// Case-insensitive extension match.
pub fn has_allowed_extension(path: &Path, exts: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    exts.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// Sanitize a filename for display or derived-id use.
///
/// Strips control characters, replaces path separators with `_`, collapses a
/// leading run of dots into a single `_`, and trims surrounding whitespace.
/// Not a security boundary; containment decisions go through `validate_path`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    let trimmed = cleaned.trim();
    let leading_dots = trimmed.chars().take_while(|&c| c == '.').count();
    if leading_dots > 0 {
        format!("_{}", &trimmed[leading_dots..])
    } else {
        trimmed.to_string()
    }
}

fn contains_nul(path: &Path) -> bool {
    path.as_os_str().as_encoded_bytes().contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use tempfile::TempDir;

    #[tokio::test]
    async fn accepts_file_inside_base() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("ok.yaml");
        std::fs::write(&file, "id: ok").unwrap();

        let validated = validate_path(&file, dir.path()).await.unwrap();
        assert!(validated.ends_with("ok.yaml"));
    }

    #[tokio::test]
    async fn rejects_parent_traversal() {
        let base = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let secret = outside.path().join("secret.yaml");
        std::fs::write(&secret, "id: secret").unwrap();

        let traversal = base.path().join("..").join(
            secret.strip_prefix(outside.path().parent().unwrap()).unwrap(),
        );
        let err = validate_path(&traversal, base.path()).await.unwrap_err();
        assert!(matches!(err, PersonaError::Security(_)));
    }

    #[tokio::test]
    async fn rejects_nonexistent_path() {
        let base = TempDir::new().unwrap();
        let missing = base.path().join("missing.yaml");
        let err = validate_path(&missing, base.path()).await.unwrap_err();
        assert!(matches!(err, PersonaError::Security(_)));
    }

    #[tokio::test]
    async fn rejects_nul_byte() {
        let base = TempDir::new().unwrap();
        let bad = PathBuf::from(OsStr::new("a\0b.yaml"));
        let err = validate_path(&bad, base.path()).await.unwrap_err();
        assert!(matches!(err, PersonaError::Security(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rejects_symlink_escape() {
        let base = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("target.yaml");
        std::fs::write(&target, "id: target").unwrap();

        let link = base.path().join("link.yaml");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = validate_path(&link, base.path()).await.unwrap_err();
        assert!(matches!(err, PersonaError::Security(_)));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(has_allowed_extension(Path::new("a.YAML"), &["yaml", "yml"]));
        assert!(has_allowed_extension(Path::new("a.yml"), &["yaml", "yml"]));
        assert!(!has_allowed_extension(Path::new("a.json"), &["yaml", "yml"]));
        assert!(!has_allowed_extension(Path::new("noext"), &["yaml"]));
    }

    #[test]
    fn sanitize_strips_controls_and_separators() {
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_filename("ok\u{0007}name"), "okname");
        assert_eq!(sanitize_filename("  padded  "), "padded");
        assert_eq!(sanitize_filename("...hidden"), "_hidden");
    }
}
