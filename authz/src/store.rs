//! The packed authorization store.
//!
//! Two matrices carry the whole privilege state: one bit per (person, role)
//! for membership, one privilege mask per (role, group). Role and group
//! slots are allocated from a free-list so deleted identities are reused
//! rather than growing the matrices forever; a reused slot is
//! indistinguishable from a fresh one, which is why callers must treat
//! identities as opaque.
//!
//! Out-of-range identities are caller bugs and panic, aborting the
//! enclosing operation rather than corrupting a cell.

use serde::Serialize;

use crate::error::AuthzError;
use crate::matrix::{BitMatrix, MaskMatrix};
use crate::models::{GroupId, PersonId, RoleId};
use crate::privileges::Privileges;

const MAGIC: &[u8; 4] = b"VPAZ";
const VERSION: u16 = 1;

/// One flipped bit from a membership row replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleChange {
    pub role: RoleId,
    /// True if the role was gained, false if it was lost.
    pub granted: bool,
}

/// Per-bit outcome of a privilege cell replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrivilegeChange {
    pub added: Privileges,
    pub removed: Privileges,
}

impl PrivilegeChange {
    /// True if the replacement changed nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Packed person-role membership and role-group privilege matrices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthStore {
    /// person rows x role columns.
    membership: BitMatrix,
    /// role rows x group columns.
    privileges: MaskMatrix,
    free_roles: Vec<RoleId>,
    free_groups: Vec<GroupId>,
}

impl AuthStore {
    /// An empty store: no people, no role or group slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of role slots, live and tombstoned.
    #[must_use]
    pub fn role_slots(&self) -> usize {
        self.membership.cols()
    }

    /// Number of group slots, live and tombstoned.
    #[must_use]
    pub fn group_slots(&self) -> usize {
        self.privileges.cols()
    }

    /// Number of person rows.
    #[must_use]
    pub fn person_rows(&self) -> usize {
        self.membership.rows()
    }

    // === Identity Allocation ===

    /// Add a person row. Rows are append-only.
    pub fn add_person(&mut self) -> PersonId {
        let id = PersonId(self.membership.rows() as u32);
        self.membership.grow_rows(self.membership.rows() + 1);
        id
    }

    /// Allocate a role slot, reusing the lowest tombstoned slot if any.
    pub fn allocate_role(&mut self) -> RoleId {
        if let Some(id) = self.free_roles.pop() {
            return id;
        }
        let id = RoleId(self.membership.cols() as u32);
        self.membership.grow_cols(self.membership.cols() + 1);
        self.privileges.grow_rows(self.privileges.rows() + 1);
        id
    }

    /// Tombstone a role slot: clear its membership bit in every person and
    /// every privilege cell, then mark the slot reusable.
    ///
    /// Returns the people whose bit was cleared, for audit.
    pub fn release_role(&mut self, role: RoleId) -> Vec<PersonId> {
        let col = self.role_index(role);
        let affected: Vec<PersonId> = (0..self.membership.rows())
            .filter(|&row| self.membership.get(row, col))
            .map(|row| PersonId(row as u32))
            .collect();
        self.membership.clear_col(col);
        self.privileges.clear_row(col);
        self.free_roles.push(role);
        self.free_roles.sort_unstable_by(|a, b| b.cmp(a));
        affected
    }

    /// Allocate a group slot, reusing the lowest tombstoned slot if any.
    pub fn allocate_group(&mut self) -> GroupId {
        if let Some(id) = self.free_groups.pop() {
            return id;
        }
        let id = GroupId(self.privileges.cols() as u32);
        self.privileges.grow_cols(self.privileges.cols() + 1);
        id
    }

    /// Tombstone a group slot: clear its privilege cell for every role and
    /// mark the slot reusable.
    pub fn release_group(&mut self, group: GroupId) {
        let col = self.group_index(group);
        self.privileges.clear_col(col);
        self.free_groups.push(group);
        self.free_groups.sort_unstable_by(|a, b| b.cmp(a));
    }

    fn role_index(&self, role: RoleId) -> usize {
        let idx = role.0 as usize;
        assert!(idx < self.role_slots(), "role {role:?} out of range");
        idx
    }

    fn group_index(&self, group: GroupId) -> usize {
        let idx = group.0 as usize;
        assert!(idx < self.group_slots(), "group {group:?} out of range");
        idx
    }

    fn person_index(&self, person: PersonId) -> usize {
        let idx = person.0 as usize;
        assert!(idx < self.person_rows(), "person {person:?} out of range");
        idx
    }

    // === Mutation ===

    /// Replace a person's full membership row.
    ///
    /// Reports one transition per role whose bit flipped, for the audit
    /// layer; nothing is logged here.
    pub fn set_person_roles<I>(&mut self, person: PersonId, roles: I) -> Vec<RoleChange>
    where
        I: IntoIterator<Item = RoleId>,
    {
        let row = self.person_index(person);
        let mut wanted = vec![false; self.role_slots()];
        for role in roles {
            wanted[self.role_index(role)] = true;
        }

        let mut changes = Vec::new();
        for (col, &want) in wanted.iter().enumerate() {
            if self.membership.get(row, col) != want {
                self.membership.set(row, col, want);
                changes.push(RoleChange {
                    role: RoleId(col as u32),
                    granted: want,
                });
            }
        }
        changes
    }

    /// Replace one (role, group) privilege cell.
    ///
    /// Reports the bits added and removed relative to the previous mask.
    pub fn set_privileges(
        &mut self,
        role: RoleId,
        mask: Privileges,
        group: GroupId,
    ) -> PrivilegeChange {
        let row = self.role_index(role);
        let col = self.group_index(group);
        let old = self.privileges.get(row, col);
        self.privileges.set(row, col, mask);
        PrivilegeChange {
            added: mask - old,
            removed: old - mask,
        }
    }

    // === Queries ===

    /// The privilege mask a role holds on a group.
    #[must_use]
    pub fn privileges(&self, role: RoleId, group: GroupId) -> Privileges {
        self.privileges.get(self.role_index(role), self.group_index(group))
    }

    /// True if the role's mask on the group is a superset of `required`.
    #[must_use]
    pub fn role_has(&self, role: RoleId, required: Privileges, group: GroupId) -> bool {
        self.privileges(role, group).has(required)
    }

    /// True if the person holds the role (directly or indirectly).
    #[must_use]
    pub fn person_holds(&self, person: PersonId, role: RoleId) -> bool {
        self.membership.get(self.person_index(person), self.role_index(role))
    }

    /// The roles a person holds, ascending by slot.
    pub fn roles_of(&self, person: PersonId) -> impl Iterator<Item = RoleId> + '_ {
        self.membership
            .row_ones(self.person_index(person))
            .map(|col| RoleId(col as u32))
    }

    /// True if any role the person holds carries `required` on the group.
    #[must_use]
    pub fn person_has(&self, person: PersonId, required: Privileges, group: GroupId) -> bool {
        self.roles_of(person)
            .any(|role| self.role_has(role, required, group))
    }

    /// True if any role the person holds carries `required` on any group.
    #[must_use]
    pub fn person_has_any(&self, person: PersonId, required: Privileges) -> bool {
        (0..self.group_slots())
            .any(|g| self.person_has(person, required, GroupId(g as u32)))
    }

    /// True if the person belongs to the group, i.e. one of their roles
    /// carries the membership privilege on it.
    #[must_use]
    pub fn is_group_member(&self, person: PersonId, group: GroupId) -> bool {
        self.person_has(person, Privileges::MEMBER, group)
    }

    /// True if the actor holds `required` on some group the target person
    /// belongs to.
    #[must_use]
    pub fn can_act_on_person(
        &self,
        actor: PersonId,
        required: Privileges,
        target: PersonId,
    ) -> bool {
        (0..self.group_slots()).any(|g| {
            let group = GroupId(g as u32);
            self.person_has(actor, required, group) && self.is_group_member(target, group)
        })
    }

    /// True if the actor holds `required` on some group the target role
    /// grants membership on.
    #[must_use]
    pub fn can_act_on_role(&self, actor: PersonId, required: Privileges, target: RoleId) -> bool {
        (0..self.group_slots()).any(|g| {
            let group = GroupId(g as u32);
            self.person_has(actor, required, group)
                && self.role_has(target, Privileges::MEMBER, group)
        })
    }

    // === Reverse Queries ===

    /// Scan people against a role mask built from `predicate`.
    fn people_matching<F>(&self, predicate: F) -> Vec<PersonId>
    where
        F: Fn(RoleId) -> bool,
    {
        let mut mask = self.membership.blank_mask();
        let mut any = false;
        for col in 0..self.role_slots() {
            if predicate(RoleId(col as u32)) {
                self.membership.mask_set(&mut mask, col);
                any = true;
            }
        }
        if !any {
            return Vec::new();
        }
        (0..self.person_rows())
            .filter(|&row| self.membership.row_intersects(row, &mask))
            .map(|row| PersonId(row as u32))
            .collect()
    }

    /// People holding the role, ascending.
    #[must_use]
    pub fn people_holding(&self, role: RoleId) -> Vec<PersonId> {
        let _ = self.role_index(role);
        self.people_matching(|r| r == role)
    }

    /// People belonging to the group, ascending.
    #[must_use]
    pub fn group_members(&self, group: GroupId) -> Vec<PersonId> {
        let _ = self.group_index(group);
        self.people_matching(|r| self.role_has(r, Privileges::MEMBER, group))
    }

    /// People holding `required` on the given group, ascending.
    #[must_use]
    pub fn people_with(&self, required: Privileges, group: GroupId) -> Vec<PersonId> {
        let _ = self.group_index(group);
        self.people_matching(|r| self.role_has(r, required, group))
    }

    /// People holding `required` on any group, ascending.
    #[must_use]
    pub fn people_with_any(&self, required: Privileges) -> Vec<PersonId> {
        self.people_matching(|r| {
            (0..self.group_slots()).any(|g| self.role_has(r, required, GroupId(g as u32)))
        })
    }

    // === Serialization ===

    /// Encode the store into its opaque persisted form.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        put_u32(&mut out, self.person_rows() as u32);
        put_u32(&mut out, self.role_slots() as u32);
        put_u32(&mut out, self.group_slots() as u32);
        put_u32(&mut out, self.free_roles.len() as u32);
        for role in &self.free_roles {
            put_u32(&mut out, role.0);
        }
        put_u32(&mut out, self.free_groups.len() as u32);
        for group in &self.free_groups {
            put_u32(&mut out, group.0);
        }
        out.extend_from_slice(self.membership.raw());
        for cell in self.privileges.cells() {
            put_u32(&mut out, cell.bits());
        }
        out
    }

    /// Decode a store previously produced by [`Self::to_bytes`].
    ///
    /// Unknown privilege bits are dropped rather than rejected, so a build
    /// with a narrower vocabulary can still read the data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthzError> {
        let mut r = Reader { bytes, pos: 0 };
        if r.take(4)? != MAGIC {
            return Err(AuthzError::BadMagic);
        }
        let version = u16::from_le_bytes(r.take(2)?.try_into().unwrap_or_default());
        if version != VERSION {
            return Err(AuthzError::UnsupportedVersion(version));
        }
        let people = r.u32()? as usize;
        let roles = r.u32()? as usize;
        let groups = r.u32()? as usize;

        let n_free_roles = r.u32()? as usize;
        let mut free_roles = Vec::new();
        for _ in 0..n_free_roles {
            let id = r.u32()?;
            if id as usize >= roles {
                return Err(AuthzError::DimensionMismatch);
            }
            free_roles.push(RoleId(id));
        }
        let n_free_groups = r.u32()? as usize;
        let mut free_groups = Vec::new();
        for _ in 0..n_free_groups {
            let id = r.u32()?;
            if id as usize >= groups {
                return Err(AuthzError::DimensionMismatch);
            }
            free_groups.push(GroupId(id));
        }

        let row_bytes = roles.div_ceil(8);
        let bit_len = people
            .checked_mul(row_bytes)
            .ok_or(AuthzError::DimensionMismatch)?;
        let bits = r.take(bit_len)?.to_vec();
        let membership =
            BitMatrix::from_raw(people, roles, bits).ok_or(AuthzError::DimensionMismatch)?;

        let n_cells = roles
            .checked_mul(groups)
            .ok_or(AuthzError::DimensionMismatch)?;
        let mut cells = Vec::new();
        for _ in 0..n_cells {
            cells.push(Privileges::from_bits_truncate(r.u32()?));
        }
        let privileges =
            MaskMatrix::from_cells(roles, groups, cells).ok_or(AuthzError::DimensionMismatch)?;

        if r.pos != bytes.len() {
            return Err(AuthzError::DimensionMismatch);
        }
        Ok(Self {
            membership,
            privileges,
            free_roles,
            free_groups,
        })
    }

    /// Rewrite a person's row without reporting transitions.
    ///
    /// Materializer use only: the pass audits by whole-record diffing, not
    /// per-bit reports.
    pub(crate) fn sync_person_row<I>(&mut self, person: PersonId, roles: I)
    where
        I: IntoIterator<Item = RoleId>,
    {
        let row = self.person_index(person);
        self.membership.clear_row(row);
        for role in roles {
            let col = self.role_index(role);
            self.membership.set(row, col, true);
        }
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], AuthzError> {
        let end = self.pos.checked_add(n).ok_or(AuthzError::Truncated)?;
        if end > self.bytes.len() {
            return Err(AuthzError::Truncated);
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, AuthzError> {
        Ok(u32::from_le_bytes(
            self.take(4)?.try_into().unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(roles: usize, groups: usize, people: usize) -> AuthStore {
        let mut store = AuthStore::new();
        for _ in 0..roles {
            store.allocate_role();
        }
        for _ in 0..groups {
            store.allocate_group();
        }
        for _ in 0..people {
            store.add_person();
        }
        store
    }

    // === Membership Row Tests ===

    #[test]
    fn test_set_person_roles_replaces_row() {
        let mut store = store_with(4, 1, 2);
        let p = PersonId(0);

        store.set_person_roles(p, [RoleId(0), RoleId(2)]);
        let changes = store.set_person_roles(p, [RoleId(2), RoleId(3)]);

        // Replace semantics: exactly the new set remains.
        let held: Vec<RoleId> = store.roles_of(p).collect();
        assert_eq!(held, vec![RoleId(2), RoleId(3)]);

        // One loss, one gain; the unchanged bit is not reported.
        assert_eq!(
            changes,
            vec![
                RoleChange {
                    role: RoleId(0),
                    granted: false
                },
                RoleChange {
                    role: RoleId(3),
                    granted: true
                },
            ]
        );
    }

    #[test]
    fn test_set_person_roles_other_rows_untouched() {
        let mut store = store_with(3, 1, 2);
        store.set_person_roles(PersonId(1), [RoleId(1)]);
        store.set_person_roles(PersonId(0), [RoleId(0)]);
        assert!(store.person_holds(PersonId(1), RoleId(1)));
        assert!(!store.person_holds(PersonId(1), RoleId(0)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_set_person_roles_bad_role_panics() {
        let mut store = store_with(2, 1, 1);
        store.set_person_roles(PersonId(0), [RoleId(5)]);
    }

    // === Privilege Cell Tests ===

    #[test]
    fn test_set_privileges_reports_bit_transitions() {
        let mut store = store_with(1, 1, 0);
        store.set_privileges(RoleId(0), Privileges::MEMBER | Privileges::SEND_TEXTS, GroupId(0));

        let change = store.set_privileges(
            RoleId(0),
            Privileges::MEMBER | Privileges::VIEW_HOLDERS,
            GroupId(0),
        );
        assert_eq!(change.added, Privileges::VIEW_HOLDERS);
        assert_eq!(change.removed, Privileges::SEND_TEXTS);
        assert!(!change.is_empty());

        let noop = store.set_privileges(
            RoleId(0),
            Privileges::MEMBER | Privileges::VIEW_HOLDERS,
            GroupId(0),
        );
        assert!(noop.is_empty());
    }

    #[test]
    fn test_role_has_is_subset_test() {
        let mut store = store_with(1, 2, 0);
        store.set_privileges(
            RoleId(0),
            Privileges::MEMBER | Privileges::MANAGE_EVENTS,
            GroupId(0),
        );

        assert!(store.role_has(RoleId(0), Privileges::MEMBER, GroupId(0)));
        assert!(store.role_has(
            RoleId(0),
            Privileges::MEMBER | Privileges::MANAGE_EVENTS,
            GroupId(0)
        ));
        assert!(!store.role_has(
            RoleId(0),
            Privileges::MEMBER | Privileges::SEND_TEXTS,
            GroupId(0)
        ));
        // The other cell is unaffected.
        assert!(!store.role_has(RoleId(0), Privileges::MEMBER, GroupId(1)));
    }

    // === Composed Query Tests ===

    #[test]
    fn test_person_has_short_circuits_across_roles() {
        let mut store = store_with(2, 1, 1);
        store.set_privileges(RoleId(1), Privileges::MANAGE_EVENTS, GroupId(0));
        store.set_person_roles(PersonId(0), [RoleId(0), RoleId(1)]);

        assert!(store.person_has(PersonId(0), Privileges::MANAGE_EVENTS, GroupId(0)));
        assert!(!store.person_has(PersonId(0), Privileges::SEND_TEXTS, GroupId(0)));
    }

    #[test]
    fn test_can_act_on_person_requires_shared_group() {
        let mut store = store_with(2, 2, 2);
        // Actor's role: manage-members on group 0 only.
        store.set_privileges(RoleId(0), Privileges::MANAGE_MEMBERS, GroupId(0));
        // Target's role: membership in group 1 only.
        store.set_privileges(RoleId(1), Privileges::MEMBER, GroupId(1));
        store.set_person_roles(PersonId(0), [RoleId(0)]);
        store.set_person_roles(PersonId(1), [RoleId(1)]);

        assert!(!store.can_act_on_person(PersonId(0), Privileges::MANAGE_MEMBERS, PersonId(1)));

        // Granting the actor's privilege on group 1 connects them.
        store.set_privileges(
            RoleId(0),
            Privileges::MANAGE_MEMBERS,
            GroupId(1),
        );
        assert!(store.can_act_on_person(PersonId(0), Privileges::MANAGE_MEMBERS, PersonId(1)));
    }

    #[test]
    fn test_can_act_on_role() {
        let mut store = store_with(2, 1, 1);
        store.set_privileges(RoleId(0), Privileges::ASSIGN_ROLES, GroupId(0));
        store.set_privileges(RoleId(1), Privileges::MEMBER, GroupId(0));
        store.set_person_roles(PersonId(0), [RoleId(0)]);

        assert!(store.can_act_on_role(PersonId(0), Privileges::ASSIGN_ROLES, RoleId(1)));
        assert!(!store.can_act_on_role(PersonId(0), Privileges::MANAGE_MEMBERS, RoleId(1)));
    }

    // === Reverse Query Tests ===

    #[test]
    fn test_people_holding_and_group_members() {
        let mut store = store_with(2, 1, 3);
        store.set_privileges(RoleId(0), Privileges::MEMBER, GroupId(0));
        store.set_person_roles(PersonId(0), [RoleId(0)]);
        store.set_person_roles(PersonId(2), [RoleId(0), RoleId(1)]);

        assert_eq!(
            store.people_holding(RoleId(0)),
            vec![PersonId(0), PersonId(2)]
        );
        assert_eq!(store.people_holding(RoleId(1)), vec![PersonId(2)]);
        assert_eq!(
            store.group_members(GroupId(0)),
            vec![PersonId(0), PersonId(2)]
        );
    }

    #[test]
    fn test_people_with_empty_when_no_role_qualifies() {
        let store = store_with(2, 1, 3);
        assert!(store.people_with(Privileges::SEND_TEXTS, GroupId(0)).is_empty());
    }

    // === Growth Safety Tests ===

    #[test]
    fn test_ninth_role_preserves_first_eight() {
        let mut store = store_with(8, 2, 2);
        store.set_person_roles(PersonId(0), [RoleId(0), RoleId(7)]);
        store.set_person_roles(PersonId(1), [RoleId(3)]);
        store.set_privileges(RoleId(7), Privileges::LEADER_DEFAULT, GroupId(1));

        // Crossing the byte boundary.
        let ninth = store.allocate_role();
        assert_eq!(ninth, RoleId(8));

        assert!(store.person_holds(PersonId(0), RoleId(0)));
        assert!(store.person_holds(PersonId(0), RoleId(7)));
        assert!(store.person_holds(PersonId(1), RoleId(3)));
        assert!(!store.person_holds(PersonId(0), RoleId(8)));
        assert_eq!(
            store.privileges(RoleId(7), GroupId(1)),
            Privileges::LEADER_DEFAULT
        );
        assert_eq!(store.privileges(RoleId(8), GroupId(1)), Privileges::empty());
    }

    #[test]
    fn test_new_group_preserves_privilege_cells() {
        let mut store = store_with(2, 1, 0);
        store.set_privileges(RoleId(1), Privileges::MEMBER, GroupId(0));

        let g = store.allocate_group();
        assert_eq!(g, GroupId(1));
        assert_eq!(store.privileges(RoleId(1), GroupId(0)), Privileges::MEMBER);
        assert_eq!(store.privileges(RoleId(1), GroupId(1)), Privileges::empty());
    }

    // === Slot Reuse Tests ===

    #[test]
    fn test_released_role_slot_is_reused_lowest_first() {
        let mut store = store_with(4, 1, 1);
        store.set_person_roles(PersonId(0), [RoleId(1), RoleId(3)]);

        let affected = store.release_role(RoleId(3));
        assert_eq!(affected, vec![PersonId(0)]);
        store.release_role(RoleId(1));

        // Lowest tombstone first, and the matrices did not grow.
        assert_eq!(store.allocate_role(), RoleId(1));
        assert_eq!(store.allocate_role(), RoleId(3));
        assert_eq!(store.role_slots(), 4);

        // The reused slot comes back clean.
        assert!(!store.person_holds(PersonId(0), RoleId(1)));
        assert!(!store.person_holds(PersonId(0), RoleId(3)));
    }

    #[test]
    fn test_released_group_slot_is_reused() {
        let mut store = store_with(1, 3, 0);
        store.set_privileges(RoleId(0), Privileges::MEMBER, GroupId(1));
        store.release_group(GroupId(1));
        assert_eq!(store.allocate_group(), GroupId(1));
        assert_eq!(store.privileges(RoleId(0), GroupId(1)), Privileges::empty());
    }

    // === Serialization Tests ===

    #[test]
    fn test_bytes_roundtrip() {
        let mut store = store_with(9, 3, 4);
        store.set_person_roles(PersonId(2), [RoleId(0), RoleId(8)]);
        store.set_privileges(RoleId(8), Privileges::LEADER_DEFAULT, GroupId(2));
        store.release_role(RoleId(4));
        store.release_group(GroupId(0));

        let bytes = store.to_bytes();
        let restored = AuthStore::from_bytes(&bytes).unwrap();
        assert_eq!(store, restored);
    }

    #[test]
    fn test_from_bytes_rejects_bad_magic() {
        let mut bytes = store_with(1, 1, 1).to_bytes();
        bytes[0] = b'X';
        assert_eq!(AuthStore::from_bytes(&bytes), Err(AuthzError::BadMagic));
    }

    #[test]
    fn test_from_bytes_rejects_unknown_version() {
        let mut bytes = store_with(1, 1, 1).to_bytes();
        bytes[4] = 0xFF;
        assert!(matches!(
            AuthStore::from_bytes(&bytes),
            Err(AuthzError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_from_bytes_rejects_truncation() {
        let bytes = store_with(2, 2, 2).to_bytes();
        assert_eq!(
            AuthStore::from_bytes(&bytes[..bytes.len() - 1]),
            Err(AuthzError::Truncated)
        );
    }

    #[test]
    fn test_from_bytes_rejects_trailing_garbage() {
        let mut bytes = store_with(1, 1, 1).to_bytes();
        bytes.push(0);
        assert_eq!(
            AuthStore::from_bytes(&bytes),
            Err(AuthzError::DimensionMismatch)
        );
    }
}
