use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use crate::{
    awards::{
        builtin::builtin_rows,
        types::{AwardDefinition, AwardId, AwardRow},
    },
    error::ConfigError,
};

/// Validated award table in prerequisite order: every award comes after all of its
/// prerequisites; awards of equal depth keep table order.
#[derive(Debug, Clone)]
pub struct AwardRegistry {
    awards: Vec<Arc<AwardDefinition>>,
    index: HashMap<AwardId, usize>,
    depth: Vec<usize>,
}

impl AwardRegistry {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_rows(builtin_rows())
    }

    pub fn from_rows(rows: Vec<AwardRow>) -> Result<Self, ConfigError> {
        if rows.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }

        let mut table_index: HashMap<AwardId, usize> = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            validate_row(row)?;
            if table_index.insert(row.id.clone(), position).is_some() {
                return Err(ConfigError::DuplicateAward(row.id.clone()));
            }
        }

        let mut prerequisites_of: Vec<Vec<usize>> = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut edges = Vec::with_capacity(row.prerequisites.len());
            for prerequisite in &row.prerequisites {
                let Some(&target) = table_index.get(&prerequisite.award) else {
                    return Err(ConfigError::UnknownPrerequisite {
                        award: row.id.clone(),
                        prerequisite: prerequisite.award.clone(),
                    });
                };
                edges.push(target);
            }
            prerequisites_of.push(edges);
        }

        let depth = prerequisite_depths(&rows, &prerequisites_of)?;

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by_key(|&position| (depth[position], position));

        let mut rows: Vec<Option<AwardRow>> = rows.into_iter().map(Some).collect();
        let mut awards = Vec::with_capacity(order.len());
        let mut ordered_depth = Vec::with_capacity(order.len());
        let mut index = HashMap::with_capacity(order.len());
        for position in order {
            let Some(row) = rows[position].take() else {
                continue;
            };
            index.insert(row.id.clone(), awards.len());
            ordered_depth.push(depth[position]);
            awards.push(Arc::new(AwardDefinition::from_row(row)));
        }

        tracing::debug!(
            target: "awards",
            awards = awards.len(),
            order = ?awards.iter().map(|award| award.id.as_str()).collect::<Vec<_>>(),
            "award_registry_built"
        );

        Ok(Self {
            awards,
            index,
            depth: ordered_depth,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Arc<AwardDefinition>> {
        self.index.get(id).map(|&position| &self.awards[position])
    }

    /// Awards in prerequisite order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<AwardDefinition>> {
        self.awards.iter()
    }

    /// Position in prerequisite order; lower ranks are reported first on ties.
    pub fn rank(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Length of the longest prerequisite chain below `id` (0 for root awards).
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.index.get(id).map(|&position| self.depth[position])
    }

    pub fn ids(&self) -> Vec<AwardId> {
        self.awards.iter().map(|award| award.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.awards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.awards.is_empty()
    }
}

fn validate_row(row: &AwardRow) -> Result<(), ConfigError> {
    if row.id.trim().is_empty() {
        return Err(ConfigError::EmptyAwardId);
    }
    let invalid = |reason: &str| ConfigError::InvalidDefinition {
        award: row.id.clone(),
        reason: reason.to_string(),
    };

    if row.name.trim().is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if row.target == 0 {
        return Err(invalid("target must be at least 1"));
    }
    if row.rule.accepted_levels.is_empty() {
        return Err(invalid("accepted_levels cannot be empty"));
    }

    let mut seen = HashSet::new();
    for prerequisite in &row.prerequisites {
        if !seen.insert(prerequisite.award.as_str()) {
            return Err(invalid(&format!(
                "prerequisite '{}' is listed twice",
                prerequisite.award
            )));
        }
        if prerequisite.min_count == Some(0) {
            return Err(invalid(&format!(
                "prerequisite '{}' has min_count 0",
                prerequisite.award
            )));
        }
    }

    let mut previous = 0;
    for endorsement in &row.endorsements {
        if endorsement.label.trim().is_empty() {
            return Err(invalid("endorsement label cannot be empty"));
        }
        if endorsement.threshold <= previous {
            return Err(invalid(
                "endorsement thresholds must be positive and strictly ascending",
            ));
        }
        previous = endorsement.threshold;
    }
    if row.endorsement_step == Some(0) {
        return Err(invalid("endorsement_step must be at least 1"));
    }

    Ok(())
}

/// Kahn's algorithm over the prerequisite graph. Leftover nodes mean a cycle.
fn prerequisite_depths(
    rows: &[AwardRow],
    prerequisites_of: &[Vec<usize>],
) -> Result<Vec<usize>, ConfigError> {
    let count = rows.len();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut pending: Vec<usize> = vec![0; count];
    for (award, prerequisites) in prerequisites_of.iter().enumerate() {
        pending[award] = prerequisites.len();
        for &prerequisite in prerequisites {
            dependents[prerequisite].push(award);
        }
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|&award| pending[award] == 0).collect();
    let mut depth = vec![0usize; count];
    let mut visited = 0;

    while let Some(award) = ready.pop_first() {
        visited += 1;
        for &dependent in &dependents[award] {
            depth[dependent] = depth[dependent].max(depth[award] + 1);
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if visited == count {
        return Ok(depth);
    }

    let stuck: Vec<usize> = (0..count).filter(|&award| pending[award] > 0).collect();
    Err(ConfigError::PrerequisiteCycle(find_cycle(
        rows,
        prerequisites_of,
        &stuck,
    )))
}

/// Walks prerequisite edges from a node that never became ready until a node repeats.
fn find_cycle(rows: &[AwardRow], prerequisites_of: &[Vec<usize>], stuck: &[usize]) -> Vec<AwardId> {
    let stuck_set: HashSet<usize> = stuck.iter().copied().collect();
    let Some(&start) = stuck.first() else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut on_path: HashMap<usize, usize> = HashMap::from([(start, 0)]);
    let mut current = start;
    loop {
        let Some(&next) = prerequisites_of[current]
            .iter()
            .find(|candidate| stuck_set.contains(candidate))
        else {
            break;
        };
        if let Some(&cycle_start) = on_path.get(&next) {
            let mut cycle: Vec<AwardId> = path[cycle_start..]
                .iter()
                .map(|&award| rows[award].id.clone())
                .collect();
            cycle.push(rows[next].id.clone());
            return cycle;
        }
        on_path.insert(next, path.len());
        path.push(next);
        current = next;
    }

    path.into_iter().map(|award| rows[award].id.clone()).collect()
}
