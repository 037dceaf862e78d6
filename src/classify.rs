//! Routing of extracted enum definitions into Swift target groups
//!
//! Routing is an ordered rule table: each rule pairs a name matcher with a
//! routing strategy, and the first rule whose matcher fires decides the groups
//! for the whole definition. Keeping the heuristic as data makes each rule
//! auditable on its own (`meshcore-sync extract` prints which rule fired).

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::schema::{EnumCase, EnumCatalog, EnumDefinition, TargetGroup};

/// How a rule decides whether it applies to a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatcher {
    /// Lower-cased definition name contains any of the tokens
    NameContainsAny(&'static [&'static str]),
    /// Name contains any token and the definition has no numeric cases
    NameContainsAnyWithoutCases(&'static [&'static str]),
    Always,
}

/// Where a matched definition's cases go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Always these groups; value filtering (if any) happens in the diff
    Fixed(&'static [TargetGroup]),
    /// Push if any value reaches the push boundary, otherwise response
    HighValueToPush,
    /// All below the boundary -> response, all above -> push, mixed -> both
    ByValueRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    pub name: &'static str,
    pub matcher: RuleMatcher,
    pub routing: Routing,
}

/// Built-in rules, evaluated top to bottom
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "command-name",
        matcher: RuleMatcher::NameContainsAny(&["req", "cmd", "command", "binary"]),
        routing: Routing::Fixed(&[TargetGroup::Command]),
    },
    ClassificationRule {
        name: "response-name",
        matcher: RuleMatcher::NameContainsAny(&["resp", "response", "event"]),
        routing: Routing::HighValueToPush,
    },
    ClassificationRule {
        name: "packet-name",
        matcher: RuleMatcher::NameContainsAny(&["packet"]),
        routing: Routing::Fixed(&[TargetGroup::Response, TargetGroup::Push]),
    },
    ClassificationRule {
        name: "categorical-type",
        matcher: RuleMatcher::NameContainsAnyWithoutCases(&["event", "type"]),
        routing: Routing::Fixed(&[]),
    },
    ClassificationRule {
        name: "value-range",
        matcher: RuleMatcher::Always,
        routing: Routing::ByValueRange,
    },
];

impl RuleMatcher {
    fn matches(&self, definition: &EnumDefinition) -> bool {
        let name = definition.name.to_lowercase();
        match self {
            Self::NameContainsAny(tokens) => tokens.iter().any(|t| name.contains(t)),
            Self::NameContainsAnyWithoutCases(tokens) => {
                definition.cases.is_empty() && tokens.iter().any(|t| name.contains(t))
            }
            Self::Always => true,
        }
    }
}

impl Routing {
    fn groups(&self, values: &[i64], push_boundary: i64) -> Vec<TargetGroup> {
        match self {
            Self::Fixed(groups) => groups.to_vec(),
            Self::HighValueToPush => {
                if values.iter().any(|&v| v >= push_boundary) {
                    vec![TargetGroup::Push]
                } else {
                    vec![TargetGroup::Response]
                }
            }
            Self::ByValueRange => {
                if values.is_empty() {
                    Vec::new()
                } else if values.iter().all(|&v| v < push_boundary) {
                    vec![TargetGroup::Response]
                } else if values.iter().all(|&v| v >= push_boundary) {
                    vec![TargetGroup::Push]
                } else {
                    vec![TargetGroup::Response, TargetGroup::Push]
                }
            }
        }
    }
}

/// Outcome of routing one definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub rule: &'static str,
    pub groups: Vec<TargetGroup>,
}

/// Extracted cases per target group, after cross-definition deduplication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedCases {
    groups: BTreeMap<TargetGroup, Vec<EnumCase>>,
    /// Cases dropped because an earlier definition already produced them
    pub dropped_duplicates: usize,
}

impl GroupedCases {
    pub fn new() -> Self {
        let groups = TargetGroup::ALL.iter().map(|g| (*g, Vec::new())).collect();
        Self {
            groups,
            dropped_duplicates: 0,
        }
    }

    pub fn get(&self, group: TargetGroup) -> &[EnumCase] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push(&mut self, group: TargetGroup, case: EnumCase) {
        self.groups.entry(group).or_default().push(case);
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Applies the rule table and deduplicates cases across definitions
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: &'static [ClassificationRule],
    push_boundary: i64,
}

impl Classifier {
    pub fn new(push_boundary: i64) -> Self {
        Self::with_rules(CLASSIFICATION_RULES, push_boundary)
    }

    pub fn with_rules(rules: &'static [ClassificationRule], push_boundary: i64) -> Self {
        Self {
            rules,
            push_boundary,
        }
    }

    /// Decide the target groups for a definition (first matching rule wins)
    pub fn route(&self, definition: &EnumDefinition) -> RouteDecision {
        let values = definition.values();
        for rule in self.rules {
            if rule.matcher.matches(definition) {
                return RouteDecision {
                    rule: rule.name,
                    groups: rule.routing.groups(&values, self.push_boundary),
                };
            }
        }
        RouteDecision {
            rule: "unmatched",
            groups: Vec::new(),
        }
    }

    /// Route every definition and collect its cases per group.
    ///
    /// A `(name, value)` pair already produced by an earlier definition is
    /// dropped before group assignment, whichever definition it came from.
    pub fn classify(&self, catalog: &EnumCatalog) -> GroupedCases {
        let mut grouped = GroupedCases::new();
        let mut seen: HashSet<(String, i64)> = HashSet::new();

        for definition in catalog.iter() {
            let decision = self.route(definition);
            tracing::debug!(
                "{} -> {:?} (rule {})",
                definition.name,
                decision.groups,
                decision.rule
            );

            for case in &definition.cases {
                if !seen.insert((case.name.clone(), case.value)) {
                    grouped.dropped_duplicates += 1;
                    continue;
                }
                for group in &decision.groups {
                    grouped.push(*group, case.clone());
                }
            }
        }

        grouped
    }
}
