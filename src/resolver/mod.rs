//! Precedence-based conflict resolution.
//!
//! Pure functions over in-memory records: no I/O, no store access. Callers
//! resolve on every read so the view always reflects the live store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{LoadedPersona, SourceTier};

/// One resolved id: the winning record and the records it shadowed.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEntry {
    pub winner: LoadedPersona,
    pub losers: Vec<LoadedPersona>,
}

/// Aggregate counts over a record collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub default_tier: usize,
    pub user_tier: usize,
    pub project_tier: usize,
    pub conflicted_ids: usize,
}

/// Group records by id and pick one winner per group.
///
/// Winner selection, in order: tier precedence (project > user > default),
/// validity (valid beats invalid), newer modification time, lexicographically
/// smaller file path, first-seen input position. The last criterion makes the
/// result input-order dependent only when two records lack both a path and a
/// modification time; everything else is a total order.
pub fn resolve(records: &[LoadedPersona]) -> BTreeMap<String, ResolvedEntry> {
    let mut groups: BTreeMap<String, Vec<&LoadedPersona>> = BTreeMap::new();
    for record in records {
        groups.entry(record.id().to_string()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(id, group)| {
            let mut winner_idx = 0;
            for (idx, candidate) in group.iter().enumerate().skip(1) {
                if beats(candidate, group[winner_idx]) {
                    winner_idx = idx;
                }
            }
            let losers = group
                .iter()
                .enumerate()
                .filter(|&(idx, _)| idx != winner_idx)
                .map(|(_, r)| (*r).clone())
                .collect();
            (
                id,
                ResolvedEntry {
                    winner: group[winner_idx].clone(),
                    losers,
                },
            )
        })
        .collect()
}

/// Strict "candidate beats incumbent" under the resolution order. Ties keep
/// the incumbent, which preserves first-seen wins for full ties.
fn beats(candidate: &LoadedPersona, incumbent: &LoadedPersona) -> bool {
    if candidate.source.tier != incumbent.source.tier {
        return candidate.source.tier > incumbent.source.tier;
    }
    if candidate.is_valid != incumbent.is_valid {
        return candidate.is_valid;
    }
    match (candidate.source.last_modified, incumbent.source.last_modified) {
        (Some(a), Some(b)) if a != b => return a > b,
        (Some(_), None) => return true,
        (None, Some(_)) => return false,
        _ => {}
    }
    match (&candidate.source.file_path, &incumbent.source.file_path) {
        (Some(a), Some(b)) if a != b => a < b,
        (Some(_), None) => true,
        _ => false,
    }
}

pub fn statistics(records: &[LoadedPersona]) -> ResolverStats {
    let mut stats = ResolverStats {
        total: records.len(),
        valid: 0,
        invalid: 0,
        default_tier: 0,
        user_tier: 0,
        project_tier: 0,
        conflicted_ids: 0,
    };

    let mut per_id: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        if record.is_valid {
            stats.valid += 1;
        } else {
            stats.invalid += 1;
        }
        match record.source.tier {
            SourceTier::Default => stats.default_tier += 1,
            SourceTier::User => stats.user_tier += 1,
            SourceTier::Project => stats.project_tier += 1,
        }
        *per_id.entry(record.id()).or_default() += 1;
    }
    stats.conflicted_ids = per_id.values().filter(|&&n| n > 1).count();
    stats
}

/// Advisory cross-tier checks. Warnings only; resolution never blocks on
/// these.
pub fn check_compatibility(records: &[LoadedPersona]) -> Vec<String> {
    let mut groups: BTreeMap<&str, Vec<&LoadedPersona>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_valid) {
        groups.entry(record.id()).or_default().push(record);
    }

    let mut warnings = Vec::new();
    for (id, group) in groups {
        if group.len() < 2 {
            continue;
        }
        let roles: Vec<&str> = dedup_sorted(group.iter().map(|r| r.persona.role.as_str()));
        if roles.len() > 1 {
            warnings.push(format!(
                "persona '{id}' declares differing roles across tiers: {}",
                roles.join(", ")
            ));
        }
        let versions: Vec<&str> = dedup_sorted(group.iter().map(|r| r.version.as_str()));
        if versions.len() > 1 {
            warnings.push(format!(
                "persona '{id}' declares differing versions across tiers: {}",
                versions.join(", ")
            ));
        }
    }
    warnings
}

fn dedup_sorted<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut v: Vec<&str> = items.collect();
    v.sort_unstable();
    v.dedup();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PersonaRecord, PersonaSource};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn record(id: &str, tier: SourceTier, path: Option<&str>) -> LoadedPersona {
        let source = match path {
            Some(p) => PersonaSource::file(tier, PathBuf::from(p), None),
            None => PersonaSource {
                tier,
                file_path: None,
                last_modified: None,
            },
        };
        LoadedPersona::valid(PersonaRecord::placeholder(id), source)
    }

    #[test]
    fn project_beats_user_beats_default() {
        let records = vec![
            record("x", SourceTier::Default, None),
            record("x", SourceTier::Project, Some("/p/x.yaml")),
            record("x", SourceTier::User, Some("/u/x.yaml")),
        ];
        let resolved = resolve(&records);
        let entry = &resolved["x"];
        assert_eq!(entry.winner.source.tier, SourceTier::Project);
        assert_eq!(entry.losers.len(), 2);
        for loser in &entry.losers {
            assert!(entry.winner.source.tier >= loser.source.tier);
        }
    }

    #[test]
    fn valid_beats_invalid_within_tier() {
        let invalid = LoadedPersona::invalid(
            "x",
            PersonaSource::file(SourceTier::User, PathBuf::from("/u/a.yaml"), None),
            vec!["broken".to_string()],
        );
        let records = vec![invalid, record("x", SourceTier::User, Some("/u/b.yaml"))];
        let resolved = resolve(&records);
        assert!(resolved["x"].winner.is_valid);
    }

    #[test]
    fn newer_modification_time_wins() {
        let mut older = record("x", SourceTier::User, Some("/u/a.yaml"));
        older.source.last_modified = Some(Utc.timestamp_opt(1_000, 0).unwrap());
        let mut newer = record("x", SourceTier::User, Some("/u/b.yaml"));
        newer.source.last_modified = Some(Utc.timestamp_opt(2_000, 0).unwrap());

        let resolved = resolve(&[older, newer.clone()]);
        assert_eq!(resolved["x"].winner.source.file_path, newer.source.file_path);
    }

    #[test]
    fn timestamped_record_wins_over_undated_in_either_order() {
        let mut dated = record("x", SourceTier::User, Some("/u/a.yaml"));
        dated.source.last_modified = Some(Utc.timestamp_opt(1_000, 0).unwrap());
        let undated = record("x", SourceTier::User, Some("/u/b.yaml"));

        let forward = resolve(&[dated.clone(), undated.clone()]);
        let reversed = resolve(&[undated, dated.clone()]);
        assert_eq!(forward["x"].winner.source.file_path, dated.source.file_path);
        assert_eq!(reversed["x"].winner.source.file_path, dated.source.file_path);
    }

    #[test]
    fn lexicographic_path_breaks_time_ties() {
        let records = vec![
            record("x", SourceTier::User, Some("/u/b.yaml")),
            record("x", SourceTier::User, Some("/u/a.yaml")),
        ];
        let resolved = resolve(&records);
        assert_eq!(
            resolved["x"].winner.source.file_path,
            Some(PathBuf::from("/u/a.yaml"))
        );
    }

    #[test]
    fn full_tie_keeps_first_seen() {
        let records = vec![
            record("x", SourceTier::Default, None),
            record("x", SourceTier::Default, None),
        ];
        let resolved = resolve(&records);
        // Input-order dependence is the documented non-determinism for
        // records lacking both path and modification time.
        assert_eq!(resolved["x"].losers.len(), 1);
    }

    #[test]
    fn resolve_is_idempotent() {
        let records = vec![
            record("x", SourceTier::Default, None),
            record("x", SourceTier::User, Some("/u/x.yaml")),
            record("y", SourceTier::Project, Some("/p/y.yaml")),
        ];
        let first = resolve(&records);
        let second = resolve(&records);
        assert_eq!(first.len(), second.len());
        for (id, entry) in &first {
            assert_eq!(entry.winner, second[id].winner);
        }
    }

    #[test]
    fn statistics_counts_tiers_and_conflicts() {
        let invalid = LoadedPersona::invalid(
            "z",
            PersonaSource::file(SourceTier::User, PathBuf::from("/u/z.yaml"), None),
            vec!["bad".to_string()],
        );
        let records = vec![
            record("x", SourceTier::Default, None),
            record("x", SourceTier::User, Some("/u/x.yaml")),
            record("y", SourceTier::Project, Some("/p/y.yaml")),
            invalid,
        ];
        let stats = statistics(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.valid, 3);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.default_tier, 1);
        assert_eq!(stats.user_tier, 2);
        assert_eq!(stats.project_tier, 1);
        assert_eq!(stats.conflicted_ids, 1);
    }

    #[test]
    fn compatibility_flags_role_drift() {
        let mut a = record("x", SourceTier::Default, None);
        a.persona.role = "architect".to_string();
        let mut b = record("x", SourceTier::User, Some("/u/x.yaml"));
        b.persona.role = "developer".to_string();

        let warnings = check_compatibility(&[a, b]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("differing roles"));
    }

    #[test]
    fn compatibility_ignores_singletons() {
        let records = vec![
            record("x", SourceTier::Default, None),
            record("y", SourceTier::User, Some("/u/y.yaml")),
        ];
        assert!(check_compatibility(&records).is_empty());
    }
}
