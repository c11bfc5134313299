//! Transitive closure of the role-implication graph.
//!
//! The direct edges are the administrator-configured Implies entries; the
//! closure is everything reachable through them. Mutations reject edges that
//! would make the graph cyclic (see [`crate::dataset::Dataset::add_implication`]),
//! so the walk here only has to terminate, not diagnose.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::RoleId;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Active,
    Done,
}

/// Compute the set of roles reachable from each role via direct edges.
///
/// Post-order, iterative: each role is finalized after all of its targets,
/// then its reachable set is the union of each target and that target's
/// reachable set. A repeat visit short-circuits on the finalized result. An
/// edge back into an unfinished role (a cycle, which mutations should have
/// made impossible) is kept as a plain reachability entry and not expanded,
/// so the walk terminates on any input.
#[must_use]
pub fn transitive_closure(
    direct: &BTreeMap<RoleId, BTreeSet<RoleId>>,
) -> BTreeMap<RoleId, BTreeSet<RoleId>> {
    let mut marks: HashMap<RoleId, Mark> = HashMap::new();
    let mut closed: BTreeMap<RoleId, BTreeSet<RoleId>> = BTreeMap::new();
    let empty = BTreeSet::new();

    for &root in direct.keys() {
        if marks.contains_key(&root) {
            continue;
        }
        // Stack of (role, next child index to visit).
        let mut stack: Vec<(RoleId, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::Active);

        while let Some(&(role, next)) = stack.last() {
            let children = direct.get(&role).unwrap_or(&empty);
            if let Some(&child) = children.iter().nth(next) {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                if !marks.contains_key(&child) {
                    marks.insert(child, Mark::Active);
                    stack.push((child, 0));
                }
            } else {
                let mut reach = BTreeSet::new();
                for &child in children {
                    if child == role {
                        continue;
                    }
                    reach.insert(child);
                    if marks.get(&child) == Some(&Mark::Done) {
                        if let Some(sub) = closed.get(&child) {
                            reach.extend(sub.iter().copied());
                        }
                    }
                }
                reach.remove(&role);
                closed.insert(role, reach);
                marks.insert(role, Mark::Done);
                stack.pop();
            }
        }
    }

    closed
}

/// True if `to` is reachable from `from` via direct edges.
///
/// Used by the mutation surface to refuse cycle-introducing edges before
/// they are written.
#[must_use]
pub fn reaches(direct: &BTreeMap<RoleId, BTreeSet<RoleId>>, from: RoleId, to: RoleId) -> bool {
    if from == to {
        return true;
    }
    let mut seen = BTreeSet::new();
    let mut work = vec![from];
    while let Some(role) = work.pop() {
        if !seen.insert(role) {
            continue;
        }
        if let Some(targets) = direct.get(&role) {
            if targets.contains(&to) {
                return true;
            }
            work.extend(targets.iter().copied());
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32)]) -> BTreeMap<RoleId, BTreeSet<RoleId>> {
        let mut g: BTreeMap<RoleId, BTreeSet<RoleId>> = BTreeMap::new();
        for &(from, to) in edges {
            g.entry(RoleId(from)).or_default().insert(RoleId(to));
        }
        g
    }

    fn set(ids: &[u32]) -> BTreeSet<RoleId> {
        ids.iter().map(|&i| RoleId(i)).collect()
    }

    #[test]
    fn test_chain_closes_transitively() {
        let g = graph(&[(1, 2), (2, 3), (3, 4)]);
        let closed = transitive_closure(&g);
        assert_eq!(closed[&RoleId(1)], set(&[2, 3, 4]));
        assert_eq!(closed[&RoleId(2)], set(&[3, 4]));
        assert_eq!(closed[&RoleId(3)], set(&[4]));
    }

    #[test]
    fn test_diamond_merges_branches() {
        let g = graph(&[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let closed = transitive_closure(&g);
        assert_eq!(closed[&RoleId(1)], set(&[2, 3, 4]));
    }

    #[test]
    fn test_shared_subtree_visited_once() {
        // Both 1 and 2 reach the 3 -> 4 -> 5 chain; memoized results must
        // serve the second visitor.
        let g = graph(&[(1, 3), (2, 3), (3, 4), (4, 5)]);
        let closed = transitive_closure(&g);
        assert_eq!(closed[&RoleId(1)], set(&[3, 4, 5]));
        assert_eq!(closed[&RoleId(2)], set(&[3, 4, 5]));
    }

    #[test]
    fn test_role_without_edges_is_absent() {
        let g = graph(&[(1, 2)]);
        let closed = transitive_closure(&g);
        assert!(!closed.contains_key(&RoleId(7)));
    }

    #[test]
    fn test_terminates_on_cycle() {
        // Mutations reject these, but a hand-corrupted dataset must not hang
        // the pass.
        let g = graph(&[(1, 2), (2, 3), (3, 1)]);
        let closed = transitive_closure(&g);
        assert!(closed[&RoleId(1)].contains(&RoleId(2)));
        assert!(closed[&RoleId(1)].contains(&RoleId(3)));
        // A role never implies itself, even through a corrupt cycle.
        assert!(!closed[&RoleId(1)].contains(&RoleId(1)));
    }

    #[test]
    fn test_self_loop_is_ignored() {
        let g = graph(&[(1, 1), (1, 2)]);
        let closed = transitive_closure(&g);
        assert_eq!(closed[&RoleId(1)], set(&[2]));
    }

    #[test]
    fn test_reaches() {
        let g = graph(&[(1, 2), (2, 3)]);
        assert!(reaches(&g, RoleId(1), RoleId(3)));
        assert!(reaches(&g, RoleId(2), RoleId(3)));
        assert!(!reaches(&g, RoleId(3), RoleId(1)));
        // Every role reaches itself.
        assert!(reaches(&g, RoleId(3), RoleId(3)));
    }
}
