//! Comparison of extracted cases against the existing Swift cases
//!
//! Every extracted case of a group lands in exactly one bucket, checked in
//! this order:
//!
//! 1. covered - same match key and value as an existing case
//! 2. duplicate - value already used by an existing case under another name
//! 3. update - same match key as an existing case, different value
//! 4. addition - nothing matches
//!
//! Because the covered check runs first, a renamed case that kept its value
//! is reported as covered or duplicate, never as an addition.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::classify::GroupedCases;
use crate::naming::match_key;
use crate::schema::{ChangeAnalysis, EnumCase, TargetCase, TargetGroup};
use crate::target::TargetDeclaration;

/// Analyze one group.
///
/// Response and push groups only see extracted values inside their range,
/// which splits cases that were routed to both groups.
pub fn analyze_group(
    group: TargetGroup,
    extracted: &[EnumCase],
    existing: &[TargetCase],
    push_boundary: i64,
) -> ChangeAnalysis {
    let relevant: Vec<&EnumCase> = extracted
        .iter()
        .filter(|c| group.accepts_value(c.value, push_boundary))
        .collect();

    let existing_keys: HashSet<(String, i64)> = existing
        .iter()
        .map(|c| (match_key(&c.name), c.value))
        .collect();
    let existing_values: HashSet<i64> = existing.iter().map(|c| c.value).collect();
    let existing_by_key: HashMap<String, &TargetCase> =
        existing.iter().map(|c| (match_key(&c.name), c)).collect();

    let mut analysis = ChangeAnalysis::new(group);

    for case in &relevant {
        let key = match_key(&case.name);
        if existing_keys.contains(&(key.clone(), case.value)) {
            analysis.covered.push((*case).clone());
        } else if existing_values.contains(&case.value) {
            analysis.duplicates.push((*case).clone());
        } else if let Some(current) = existing_by_key.get(&key) {
            analysis.updates.push(((*case).clone(), (*current).clone()));
        } else {
            analysis.additions.push((*case).clone());
        }
    }

    let extracted_keys: HashSet<String> = relevant.iter().map(|c| match_key(&c.name)).collect();
    let extracted_values: HashSet<i64> = relevant.iter().map(|c| c.value).collect();
    analysis.target_only_extras = existing
        .iter()
        .filter(|c| !extracted_keys.contains(&match_key(&c.name)) && !extracted_values.contains(&c.value))
        .cloned()
        .collect();

    analysis
}

/// Analyze all groups in the fixed order command, response, push
pub fn analyze_all(
    grouped: &GroupedCases,
    declaration: &TargetDeclaration,
    push_boundary: i64,
) -> Vec<ChangeAnalysis> {
    TargetGroup::ALL
        .iter()
        .map(|group| {
            analyze_group(
                *group,
                grouped.get(*group),
                declaration.cases(*group),
                push_boundary,
            )
        })
        .collect()
}

/// Totals across groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeTotals {
    pub additions: usize,
    pub updates: usize,
    pub duplicates: usize,
    pub target_only_extras: usize,
}

impl ChangeTotals {
    pub fn of(analyses: &[ChangeAnalysis]) -> Self {
        analyses.iter().fold(Self::default(), |acc, a| Self {
            additions: acc.additions + a.additions.len(),
            updates: acc.updates + a.updates.len(),
            duplicates: acc.duplicates + a.duplicates.len(),
            target_only_extras: acc.target_only_extras + a.target_only_extras.len(),
        })
    }
}
