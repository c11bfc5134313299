//! The loaded authorization state and its administrative mutation surface.
//!
//! A `Dataset` is the full in-memory state the storage collaborator loads:
//! the packed matrices plus the role, group, person, and list records.
//! Mutations here change primary facts only; the derived fields are rebuilt
//! by [`crate::materialize::materialize`], which callers run after any
//! structural change.
//!
//! Business-rule validation (duplicate names, sensible privilege
//! combinations) belongs to the calling layer; identities that are deleted
//! or out of range are caller bugs and panic.

use std::collections::{BTreeMap, BTreeSet};

use crate::closure::reaches;
use crate::error::AuthzError;
use crate::models::{
    Group, GroupId, List, ListFlags, ListId, ListKind, ListLink, Person, PersonId, Provenance,
    Role, RoleFlags, RoleId, DISABLED_ROLE, WEBMASTER_ROLE,
};
use crate::privileges::{Org, PrivLevel, Privileges};
use crate::store::{AuthStore, PrivilegeChange, RoleChange};

/// Primary fields of a new role.
#[derive(Debug, Clone)]
pub struct RoleDef {
    pub name: String,
    pub title: Option<String>,
    pub org: Org,
    pub priv_level: PrivLevel,
    pub flags: RoleFlags,
    pub priority: i32,
}

impl Default for RoleDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: None,
            org: Org::Administration,
            priv_level: PrivLevel::None,
            flags: RoleFlags::empty(),
            priority: 0,
        }
    }
}

/// The full authorization state of the portal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub(crate) store: AuthStore,
    pub(crate) roles: Vec<Option<Role>>,
    pub(crate) groups: Vec<Option<Group>>,
    pub(crate) people: Vec<Person>,
    pub(crate) lists: BTreeMap<ListId, List>,
    pub(crate) next_list: u32,
}

impl Dataset {
    /// A fresh dataset with the well-known webmaster and disabled-login
    /// roles seeded in their fixed slots.
    #[must_use]
    pub fn bootstrap() -> Self {
        let mut data = Self::default();
        let webmaster = data.create_role(RoleDef {
            name: "Webmaster".into(),
            title: Some("Webmaster".into()),
            org: Org::Administration,
            priv_level: PrivLevel::Leader,
            ..RoleDef::default()
        });
        let disabled = data.create_role(RoleDef {
            name: "Disabled Login".into(),
            org: Org::Administration,
            priority: i32::MAX,
            ..RoleDef::default()
        });
        debug_assert_eq!(webmaster, WEBMASTER_ROLE);
        debug_assert_eq!(disabled, DISABLED_ROLE);
        data
    }

    /// The packed store, for the privilege query surface.
    #[must_use]
    pub const fn store(&self) -> &AuthStore {
        &self.store
    }

    // === Record Access ===

    /// Look up a role. `None` for tombstoned slots.
    #[must_use]
    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Mutable role record. Derived fields belong to the materializer.
    pub fn role_mut(&mut self, id: RoleId) -> Option<&mut Role> {
        self.roles.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Live roles, ascending by slot.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter().flatten()
    }

    /// Look up a group. `None` for tombstoned slots.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Mutable group record.
    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Live groups, ascending by slot.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().flatten()
    }

    /// Look up a person.
    #[must_use]
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.get(id.0 as usize)
    }

    /// All people, row order.
    #[must_use]
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Look up a list.
    #[must_use]
    pub fn list(&self, id: ListId) -> Option<&List> {
        self.lists.get(&id)
    }

    /// All lists, ascending by identity.
    pub fn lists(&self) -> impl Iterator<Item = &List> {
        self.lists.values()
    }

    // === Role and Group Lifecycle ===

    /// Create a role, reusing the lowest tombstoned slot if any.
    pub fn create_role(&mut self, def: RoleDef) -> RoleId {
        let id = self.store.allocate_role();
        if self.roles.len() < self.store.role_slots() {
            self.roles.resize(self.store.role_slots(), None);
        }
        self.roles[id.0 as usize] = Some(Role {
            id,
            name: def.name,
            title: def.title,
            org: def.org,
            priv_level: def.priv_level,
            flags: def.flags,
            priority: def.priority,
            implies: BTreeMap::new(),
            lists: BTreeMap::new(),
            people: Vec::new(),
        });
        id
    }

    /// Delete a role: tombstone its slot and clear its packed cells.
    ///
    /// Returns the people whose membership bit was cleared, for audit.
    /// References from other roles' Implies entries and from person records
    /// are pruned by the next materialization pass.
    pub fn delete_role(&mut self, id: RoleId) -> Vec<PersonId> {
        assert!(self.role(id).is_some(), "role {id:?} is not live");
        let affected = self.store.release_role(id);
        self.roles[id.0 as usize] = None;
        affected
    }

    /// Create a group, reusing the lowest tombstoned slot if any.
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        tag: Option<String>,
        email: Option<String>,
    ) -> GroupId {
        let id = self.store.allocate_group();
        if self.groups.len() < self.store.group_slots() {
            self.groups.resize(self.store.group_slots(), None);
        }
        self.groups[id.0 as usize] = Some(Group {
            id,
            name: name.into(),
            tag,
            email,
        });
        id
    }

    /// Delete a group: tombstone its slot and clear its privilege cells.
    pub fn delete_group(&mut self, id: GroupId) {
        assert!(self.group(id).is_some(), "group {id:?} is not live");
        self.store.release_group(id);
        self.groups[id.0 as usize] = None;
    }

    // === People and Lists ===

    /// Register a person. Rows are append-only.
    pub fn add_person(&mut self, informal_name: impl Into<String>) -> PersonId {
        let id = self.store.add_person();
        self.people.push(Person {
            id,
            informal_name: informal_name.into(),
            roles: BTreeMap::new(),
            sorted_roles: Vec::new(),
            orgs: Default::default(),
        });
        id
    }

    /// Create a list. List identities are never reused.
    pub fn create_list(&mut self, kind: ListKind, name: impl Into<String>) -> ListId {
        let id = ListId(self.next_list);
        self.next_list += 1;
        self.lists.insert(
            id,
            List {
                id,
                kind,
                name: name.into(),
                people: BTreeMap::new(),
            },
        );
        id
    }

    /// Delete a list. Role associations pointing at it are pruned by the
    /// next materialization pass.
    pub fn delete_list(&mut self, id: ListId) {
        let removed = self.lists.remove(&id);
        assert!(removed.is_some(), "list {id:?} does not exist");
    }

    // === Primary-Fact Mutations ===

    /// Replace a person's direct roles.
    ///
    /// Indirect entries are dropped here and rebuilt by the next pass.
    /// Reports one transition per flipped membership bit; turning the report
    /// into audit text is the caller's job.
    pub fn set_person_roles(&mut self, person: PersonId, roles: &BTreeSet<RoleId>) -> Vec<RoleChange> {
        for &id in roles {
            assert!(self.role(id).is_some(), "role {id:?} is not live");
        }
        let changes = self.store.set_person_roles(person, roles.iter().copied());
        let record = &mut self.people[person.0 as usize];
        record.roles = roles.iter().map(|&id| (id, Provenance::Direct)).collect();
        changes
    }

    /// Replace one (role, group) privilege cell.
    pub fn set_privileges(
        &mut self,
        role: RoleId,
        mask: Privileges,
        group: GroupId,
    ) -> PrivilegeChange {
        assert!(self.role(role).is_some(), "role {role:?} is not live");
        assert!(self.group(group).is_some(), "group {group:?} is not live");
        self.store.set_privileges(role, mask, group)
    }

    /// Add a direct implication edge.
    ///
    /// Refused if the edge would make the implication graph cyclic; this is
    /// the only structural rule enforced at write time, because a cycle
    /// would otherwise poison every later closure computation.
    pub fn add_implication(&mut self, from: RoleId, to: RoleId) -> Result<(), AuthzError> {
        assert!(self.role(from).is_some(), "role {from:?} is not live");
        assert!(self.role(to).is_some(), "role {to:?} is not live");
        let direct = self.direct_implies();
        if reaches(&direct, to, from) {
            return Err(AuthzError::ImplicationCycle { from, to });
        }
        self.role_mut(from)
            .expect("liveness checked above")
            .implies
            .insert(to, Provenance::Direct);
        Ok(())
    }

    /// Remove a direct implication edge. Indirect entries derived through
    /// it disappear on the next pass.
    pub fn remove_implication(&mut self, from: RoleId, to: RoleId) {
        assert!(self.role(from).is_some(), "role {from:?} is not live");
        if let Some(role) = self.role_mut(from) {
            if role.implies.get(&to).is_some_and(|p| p.is_direct()) {
                role.implies.remove(&to);
            }
        }
    }

    /// Associate a role with a list.
    pub fn link_list(&mut self, role: RoleId, list: ListId, link: ListLink) {
        assert!(self.lists.contains_key(&list), "list {list:?} does not exist");
        let record = self.role_mut(role).unwrap_or_else(|| panic!("role {role:?} is not live"));
        record.lists.insert(list, link);
    }

    /// Drop a role's association with a list.
    pub fn unlink_list(&mut self, role: RoleId, list: ListId) {
        let record = self.role_mut(role).unwrap_or_else(|| panic!("role {role:?} is not live"));
        record.lists.remove(&list);
    }

    /// Record a manual subscription: sets the subscribed bit and clears an
    /// earlier explicit unsubscribe.
    pub fn subscribe(&mut self, person: PersonId, list: ListId) {
        assert!((person.0 as usize) < self.people.len(), "person {person:?} out of range");
        let record = self.lists.get_mut(&list).unwrap_or_else(|| panic!("list {list:?} does not exist"));
        let flags = record.people.entry(person).or_default();
        flags.insert(ListFlags::SUBSCRIBED);
        flags.remove(ListFlags::UNSUBSCRIBED);
    }

    /// Record an explicit unsubscribe. Durable: every later pass honors it
    /// until the person subscribes again.
    pub fn unsubscribe(&mut self, person: PersonId, list: ListId) {
        assert!((person.0 as usize) < self.people.len(), "person {person:?} out of range");
        let record = self.lists.get_mut(&list).unwrap_or_else(|| panic!("list {list:?} does not exist"));
        let flags = record.people.entry(person).or_default();
        flags.insert(ListFlags::UNSUBSCRIBED);
        flags.remove(ListFlags::SUBSCRIBED);
    }

    /// Direct implication edges of live roles, for closure and cycle checks.
    pub(crate) fn direct_implies(&self) -> BTreeMap<RoleId, BTreeSet<RoleId>> {
        self.roles()
            .map(|role| {
                (
                    role.id,
                    role.implies
                        .iter()
                        .filter(|(_, p)| p.is_direct())
                        .map(|(&id, _)| id)
                        .collect(),
                )
            })
            .collect()
    }
}
