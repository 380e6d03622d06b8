//! Tier merge: first writer wins.
//!
//! Sources are scanned in precedence order. The first declaration of a name
//! becomes the effective server; later same-named declarations are shadowed
//! and recorded in a [`ConflictRecord`].

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::mcp::ClassifiedServer;
use crate::types::Tier;

/// One declaration site of a server name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub tier: Tier,
    pub source: PathBuf,
}

/// A server name declared in more than one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    pub name: String,
    /// Every declaration, highest precedence first.
    pub occurrences: Vec<Occurrence>,
    pub winner: Tier,
    pub shadowed: Vec<Tier>,
}

/// Effective servers plus the conflicts found while merging.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// One server per distinct name, in first-seen order.
    pub effective: Vec<ClassifiedServer>,
    pub conflicts: Vec<ConflictRecord>,
}

/// Merge classified servers from every tier.
///
/// Input order within a tier is kept; across tiers the fixed precedence
/// order decides.
pub fn merge_servers(all: &[ClassifiedServer]) -> MergeOutcome {
    let mut ordered: Vec<&ClassifiedServer> = all.iter().collect();
    ordered.sort_by_key(|server| server.tier.precedence());

    let mut groups: Vec<Vec<&ClassifiedServer>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for server in ordered {
        match index.get(server.name.as_str()) {
            Some(&slot) => groups[slot].push(server),
            None => {
                index.insert(server.name.as_str(), groups.len());
                groups.push(vec![server]);
            }
        }
    }

    let mut outcome = MergeOutcome::default();
    for group in groups {
        let winner = group[0];
        if group.len() > 1 {
            tracing::debug!(
                name = %winner.name,
                winner = %winner.tier,
                shadowed = group.len() - 1,
                "server declared in multiple tiers"
            );
            outcome.conflicts.push(ConflictRecord {
                name: winner.name.clone(),
                occurrences: group
                    .iter()
                    .map(|server| Occurrence {
                        tier: server.tier,
                        source: server.source.clone(),
                    })
                    .collect(),
                winner: winner.tier,
                shadowed: group[1..].iter().map(|server| server.tier).collect(),
            });
        }
        outcome.effective.push(winner.clone());
    }
    outcome
}
