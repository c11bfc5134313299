//! The derived-state materializer.
//!
//! One full recompute, run after any structural change to roles, implication
//! edges, role-to-list associations, or list membership. The pass is a repair
//! pass, not a validator: dangling references are dropped silently, and the
//! only errors it can return are the storage collaborator's. Atomicity is the
//! collaborator's job too: either everything written here is persisted or
//! none of it is.
//!
//! Phases, in order: snapshot for audit, clean, closure, propagate to
//! people, aggregate, list membership, persist. Every container written here
//! is ordered, so running the pass twice without an intervening primary
//! change yields byte-identical derived state.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use tracing::{debug, info};

use crate::closure::transitive_closure;
use crate::dataset::Dataset;
use crate::models::{ListFlags, ListId, PersonId, Provenance, Role, RoleId, SubscriptionModel, DISABLED_ROLE};
use crate::storage::{Snapshot, Storage};

/// Recompute all derived state from primary facts and persist the result.
///
/// Returns the pre-change snapshot for the caller's audit diffing.
///
/// # Examples
///
/// ```
/// use vp_authz::{materialize, Dataset, MemStorage};
///
/// let mut storage = MemStorage::default();
/// let mut data = Dataset::bootstrap();
/// let before = materialize(&mut data, &mut storage).unwrap();
/// assert!(before.roles.is_empty());
/// ```
#[tracing::instrument(skip_all)]
pub fn materialize<S: Storage + ?Sized>(data: &mut Dataset, storage: &mut S) -> Result<Snapshot> {
    let before = storage.snapshot()?;

    let manual = clean(data);
    apply_closure(data);
    propagate(data);
    aggregate(data);
    apply_lists(data, &manual);

    storage.persist(data)?;
    info!(
        roles = data.roles().count(),
        people = data.people().len(),
        lists = data.lists().count(),
        "derived state recomputed"
    );
    Ok(before)
}

/// Phase 2: drop derived and dangling entries, capture the
/// manual-subscription side table, reset computed fields.
fn clean(data: &mut Dataset) -> BTreeMap<ListId, BTreeSet<PersonId>> {
    let live: BTreeSet<RoleId> = data.roles().map(|r| r.id).collect();
    let implicit: BTreeSet<RoleId> = data
        .roles()
        .filter(|r| r.is_implicit_only())
        .map(|r| r.id)
        .collect();

    for role in data.roles.iter_mut().flatten() {
        role.implies
            .retain(|id, prov| prov.is_direct() && live.contains(id));
        role.lists.retain(|id, _| data.lists.contains_key(id));
        role.people.clear();
    }

    for person in &mut data.people {
        person
            .roles
            .retain(|id, prov| prov.is_direct() && live.contains(id) && !implicit.contains(id));
        person.sorted_roles.clear();
        person.orgs = Default::default();
    }
    for idx in 0..data.people.len() {
        let direct: Vec<RoleId> = data.people[idx].roles.keys().copied().collect();
        data.store.sync_person_row(PersonId(idx as u32), direct);
    }

    // Capture who is subscribed before the computed bits are cleared: on an
    // opt-in list that bit can only have come from a manual action. Bits of
    // people directly holding the disabled role are left untouched so a
    // later re-enable restores their subscriptions.
    let mut manual: BTreeMap<ListId, BTreeSet<PersonId>> = BTreeMap::new();
    let people = &data.people;
    for (id, list) in &mut data.lists {
        let subscribed: BTreeSet<PersonId> = list
            .people
            .iter()
            .filter(|(_, f)| f.contains(ListFlags::SUBSCRIBED))
            .map(|(&p, _)| p)
            .collect();
        manual.insert(*id, subscribed);

        list.people.retain(|pid, flags| {
            match people.get(pid.0 as usize) {
                // Dangling person reference: prune.
                None => false,
                Some(p) if p.holds_directly(DISABLED_ROLE) => true,
                Some(_) => {
                    flags.remove(ListFlags::SUBSCRIBED | ListFlags::SENDER);
                    !flags.is_empty()
                }
            }
        });
    }
    manual
}

/// Phase 3: close the implication graph and write the indirect entries.
fn apply_closure(data: &mut Dataset) {
    let direct = data.direct_implies();
    let closed = transitive_closure(&direct);
    debug!(roles = closed.len(), "implication closure computed");

    for role in data.roles.iter_mut().flatten() {
        if let Some(reach) = closed.get(&role.id) {
            for &target in reach {
                role.implies.entry(target).or_insert(Provenance::Indirect);
            }
        }
    }
}

/// Phase 4: every role a person's direct roles imply is held indirectly.
fn propagate(data: &mut Dataset) {
    let roles = &data.roles;
    for person in &mut data.people {
        let direct: Vec<RoleId> = person
            .roles
            .iter()
            .filter(|(_, p)| p.is_direct())
            .map(|(&id, _)| id)
            .collect();
        for rid in direct {
            let Some(role) = roles[rid.0 as usize].as_ref() else {
                continue;
            };
            for &target in role.implies.keys() {
                person.roles.entry(target).or_insert(Provenance::Indirect);
            }
        }
    }
}

fn held_in_priority_order<'a>(
    roles: &'a [Option<Role>],
    person: &crate::models::Person,
) -> Vec<(&'a Role, Provenance)> {
    let mut held: Vec<(&Role, Provenance)> = person
        .roles
        .iter()
        .filter_map(|(&rid, &prov)| roles[rid.0 as usize].as_ref().map(|r| (r, prov)))
        .collect();
    held.sort_by_key(|(r, _)| (r.priority, r.id));
    held
}

/// Phase 5: reverse rosters, display ordering, per-organization levels and
/// titles, and the packed rows for direct-plus-indirect holds.
fn aggregate(data: &mut Dataset) {
    let roles = &data.roles;
    for person in &mut data.people {
        let held = held_in_priority_order(roles, person);

        person.sorted_roles = held
            .iter()
            .filter(|(_, prov)| prov.is_direct())
            .map(|(r, _)| r.id)
            .collect();

        // Holders of the disabled role keep their role relation but
        // contribute nothing to organization standing.
        if !person.holds(DISABLED_ROLE) {
            for (role, _) in &held {
                let record = &mut person.orgs[role.org.index()];
                if role.priv_level > record.level {
                    record.level = role.priv_level;
                }
                if record.title.is_none() {
                    if let Some(title) = role.title.as_ref().filter(|t| !t.is_empty()) {
                        record.title = Some(title.clone());
                    }
                }
            }
        }
    }

    for idx in 0..data.people.len() {
        let held: Vec<RoleId> = data.people[idx].roles.keys().copied().collect();
        data.store.sync_person_row(PersonId(idx as u32), held);
    }

    let people = &data.people;
    for role in data.roles.iter_mut().flatten() {
        for person in people {
            if person.holds(role.id) {
                role.people.push(person.id);
            }
        }
    }
}

/// Phase 6: list subscriber and sender bits from role-to-list associations.
fn apply_lists(data: &mut Dataset, manual: &BTreeMap<ListId, BTreeSet<PersonId>>) {
    let roles = &data.roles;
    let lists = &mut data.lists;
    for person in &data.people {
        if person.is_disabled() {
            continue;
        }
        for &rid in person.roles.keys() {
            let Some(role) = roles[rid.0 as usize].as_ref() else {
                continue;
            };
            for (lid, link) in &role.lists {
                let Some(list) = lists.get_mut(lid) else {
                    continue;
                };
                let mut flags = list.people.get(&person.id).copied().unwrap_or_default();
                if link.sender {
                    flags.insert(ListFlags::SENDER);
                }
                if !flags.contains(ListFlags::UNSUBSCRIBED) {
                    match link.model {
                        SubscriptionModel::None => {}
                        SubscriptionModel::OptIn => {
                            if manual.get(lid).is_some_and(|s| s.contains(&person.id)) {
                                flags.insert(ListFlags::SUBSCRIBED);
                            }
                        }
                        SubscriptionModel::Automatic | SubscriptionModel::AutomaticWarned => {
                            flags.insert(ListFlags::SUBSCRIBED);
                        }
                    }
                }
                if flags.is_empty() {
                    list.people.remove(&person.id);
                } else {
                    list.people.insert(person.id, flags);
                }
            }
        }
    }
}
