//! Schema validator: YAML text to a checked `PersonaRecord`.
//!
//! Validation walks the parsed document and collects every structural problem
//! with its field path, instead of stopping at the first serde error. Only a
//! document that passes the walk is deserialized into the typed record.

use serde_yaml_bw::Value;

use crate::domain::PersonaRecord;

/// Why a document was rejected: the text never parsed as YAML, or it parsed
/// but broke the required shape. `Shape` carries one message per field-level
/// problem and is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaFailure {
    Parse(String),
    Shape(Vec<String>),
}

/// Parse and validate one persona document.
pub fn parse_and_validate(content: &str) -> std::result::Result<PersonaRecord, SchemaFailure> {
    let value: Value = match serde_yaml_bw::from_str(content) {
        Ok(v) => v,
        Err(e) => return Err(SchemaFailure::Parse(e.to_string())),
    };

    let errors = validate_shape(&value);
    if !errors.is_empty() {
        return Err(SchemaFailure::Shape(errors));
    }

    // The walk above guarantees the required shape; a failure here means the
    // document used a representation serde cannot map (kept as a hard error).
    serde_yaml_bw::from_str(content)
        .map_err(|e| SchemaFailure::Parse(format!("deserialization failed: {e}")))
}

fn validate_shape(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    if value.as_mapping().is_none() {
        errors.push("document: expected a mapping at the top level".to_string());
        return errors;
    }

    require_str(value, "id", &mut errors);
    require_str(value, "name", &mut errors);
    require_str(value, "role", &mut errors);

    match value.get("core") {
        Some(core) if core.as_mapping().is_some() => {
            require_nested_str(core, "core", "identity", &mut errors);
            require_nested_str(core, "core", "primaryObjective", &mut errors);
            require_nested_str_seq(core, "core", "constraints", &mut errors);
        }
        Some(_) => errors.push("core: expected a mapping".to_string()),
        None => errors.push("core: missing required section".to_string()),
    }

    match value.get("behavior") {
        Some(behavior) if behavior.as_mapping().is_some() => {
            for key in ["mindset", "methodology", "priorities", "antiPatterns"] {
                require_nested_str_seq(behavior, "behavior", key, &mut errors);
            }
        }
        Some(_) => errors.push("behavior: expected a mapping".to_string()),
        None => errors.push("behavior: missing required section".to_string()),
    }

    match value.get("expertise") {
        Some(expertise) if expertise.as_mapping().is_some() => {
            require_nested_str_seq(expertise, "expertise", "domains", &mut errors);
            require_nested_str_seq(expertise, "expertise", "skills", &mut errors);
        }
        Some(_) => errors.push("expertise: expected a mapping".to_string()),
        None => errors.push("expertise: missing required section".to_string()),
    }

    require_str_seq(value, "decisionCriteria", &mut errors);

    for key in ["examples", "tags"] {
        if let Some(field) = value.get(key)
            && !is_str_seq(field)
        {
            errors.push(format!("{key}: expected a sequence of strings"));
        }
    }

    if let Some(version) = value.get("version")
        && version.as_str().is_none()
    {
        errors.push("version: expected a string".to_string());
    }

    if let Some(diagrams) = value.get("behaviorDiagrams") {
        match diagrams.as_sequence() {
            Some(seq) => {
                for (i, diagram) in seq.iter().enumerate() {
                    for key in ["title", "description", "diagramType", "diagramSource"] {
                        if diagram.get(key).and_then(Value::as_str).is_none() {
                            errors.push(format!(
                                "behaviorDiagrams[{i}].{key}: expected a string"
                            ));
                        }
                    }
                }
            }
            None => errors.push("behaviorDiagrams: expected a sequence".to_string()),
        }
    }

    errors
}

fn require_str(value: &Value, key: &str, errors: &mut Vec<String>) {
    match value.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => {}
        Some(_) => errors.push(format!("{key}: must not be empty")),
        None => errors.push(format!("{key}: expected a non-empty string")),
    }
}

fn require_nested_str(parent: &Value, section: &str, key: &str, errors: &mut Vec<String>) {
    if parent.get(key).and_then(Value::as_str).is_none() {
        errors.push(format!("{section}.{key}: expected a string"));
    }
}

fn require_str_seq(value: &Value, key: &str, errors: &mut Vec<String>) {
    match value.get(key) {
        Some(field) if is_str_seq(field) => {}
        Some(_) => errors.push(format!("{key}: expected a sequence of strings")),
        None => errors.push(format!("{key}: missing required field")),
    }
}

fn require_nested_str_seq(parent: &Value, section: &str, key: &str, errors: &mut Vec<String>) {
    match parent.get(key) {
        Some(field) if is_str_seq(field) => {}
        Some(_) => errors.push(format!("{section}.{key}: expected a sequence of strings")),
        None => errors.push(format!("{section}.{key}: missing required field")),
    }
}

fn is_str_seq(value: &Value) -> bool {
    value
        .as_sequence()
        .is_some_and(|seq| seq.iter().all(|item| item.as_str().is_some()))
}
