use serde::{Deserialize, Serialize};

/// A structured behavioral template record.
///
/// Field names serialize in camelCase to match the on-disk YAML schema
/// (`primaryObjective`, `antiPatterns`, `decisionCriteria`, ...). The core
/// treats the payload as an opaque, schema-validated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    pub core: PersonaCore,
    pub behavior: PersonaBehavior,
    pub expertise: PersonaExpertise,
    pub decision_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behavior_diagrams: Vec<BehaviorDiagram>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaCore {
    pub identity: String,
    pub primary_objective: String,
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaBehavior {
    pub mindset: Vec<String>,
    pub methodology: Vec<String>,
    pub priorities: Vec<String>,
    pub anti_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaExpertise {
    pub domains: Vec<String>,
    pub skills: Vec<String>,
}

/// Optional illustrative diagram attached to a persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorDiagram {
    pub title: String,
    pub description: String,
    pub diagram_type: String,
    pub diagram_source: String,
}

impl PersonaRecord {
    /// Placeholder record for a file that failed to load. Carries the derived
    /// id so the failure stays addressable in diagnostics.
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            role: "unknown".to_string(),
            core: PersonaCore {
                identity: String::new(),
                primary_objective: String::new(),
                constraints: Vec::new(),
            },
            behavior: PersonaBehavior {
                mindset: Vec::new(),
                methodology: Vec::new(),
                priorities: Vec::new(),
                anti_patterns: Vec::new(),
            },
            expertise: PersonaExpertise {
                domains: Vec::new(),
                skills: Vec::new(),
            },
            decision_criteria: Vec::new(),
            examples: Vec::new(),
            tags: Vec::new(),
            version: None,
            behavior_diagrams: Vec::new(),
        }
    }
}
