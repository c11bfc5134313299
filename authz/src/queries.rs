//! The privilege query surface.
//!
//! Named, side-effect-free predicates composed over the packed store, used
//! by request handlers to gate individual operations. Every predicate takes
//! the caller's identity explicitly; there is no ambient notion of a
//! current user anywhere in the engine. All of these are pure functions of
//! the materialized state.

use crate::dataset::Dataset;
use crate::models::{GroupId, PersonId, RoleId, DISABLED_ROLE, WEBMASTER_ROLE};
use crate::privileges::Privileges;

/// True if the caller holds the webmaster role. Webmasters bypass every
/// other predicate here.
#[must_use]
pub fn is_webmaster(data: &Dataset, caller: PersonId) -> bool {
    data.store().person_holds(caller, WEBMASTER_ROLE)
}

/// True if the person's login is disabled.
#[must_use]
pub fn is_disabled(data: &Dataset, person: PersonId) -> bool {
    data.store().person_holds(person, DISABLED_ROLE)
}

/// True if the caller may see the target person in rosters and searches.
#[must_use]
pub fn can_view_person(data: &Dataset, caller: PersonId, target: PersonId) -> bool {
    is_webmaster(data, caller)
        || data
            .store()
            .can_act_on_person(caller, Privileges::VIEW_HOLDERS, target)
}

/// True if the caller may see the target person's contact details.
#[must_use]
pub fn can_view_contact_info(data: &Dataset, caller: PersonId, target: PersonId) -> bool {
    is_webmaster(data, caller)
        || data
            .store()
            .can_act_on_person(caller, Privileges::VIEW_CONTACT_INFO, target)
}

/// True if the caller may create, edit, or cancel the group's events.
#[must_use]
pub fn can_manage_event(data: &Dataset, caller: PersonId, group: GroupId) -> bool {
    is_webmaster(data, caller)
        || data
            .store()
            .person_has(caller, Privileges::MANAGE_EVENTS, group)
}

/// True if the caller may edit membership records of people in the group.
#[must_use]
pub fn can_manage_members(data: &Dataset, caller: PersonId, group: GroupId) -> bool {
    is_webmaster(data, caller)
        || data
            .store()
            .person_has(caller, Privileges::MANAGE_MEMBERS, group)
}

/// True if the caller may grant or revoke the role: they must hold the
/// assign-role privilege on a group the role grants membership on.
#[must_use]
pub fn can_assign_role(data: &Dataset, caller: PersonId, role: RoleId) -> bool {
    is_webmaster(data, caller)
        || data
            .store()
            .can_act_on_role(caller, Privileges::ASSIGN_ROLES, role)
}

/// True if the caller may send text messages anywhere in the portal.
#[must_use]
pub fn can_send_texts(data: &Dataset, caller: PersonId) -> bool {
    is_webmaster(data, caller)
        || data
            .store()
            .person_has_any(caller, Privileges::SEND_TEXTS)
}

/// True if the caller may see who holds the role.
///
/// A role flagged to show its roster is visible to anyone with membership
/// anywhere; otherwise the caller needs the view-holders privilege on one
/// of the role's membership groups.
#[must_use]
pub fn can_view_roster(data: &Dataset, caller: PersonId, role: RoleId) -> bool {
    if is_webmaster(data, caller) {
        return true;
    }
    let shows = data.role(role).is_some_and(crate::models::Role::shows_roster);
    if shows && data.store().person_has_any(caller, Privileges::MEMBER) {
        return true;
    }
    data.store()
        .can_act_on_role(caller, Privileges::VIEW_HOLDERS, role)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::dataset::RoleDef;
    use crate::materialize::materialize;
    use crate::models::RoleFlags;
    use crate::privileges::{Org, PrivLevel};
    use crate::storage::MemStorage;

    struct Fixture {
        data: Dataset,
        group: GroupId,
        member_role: RoleId,
        lead_role: RoleId,
        member: PersonId,
        lead: PersonId,
        outsider: PersonId,
        root: PersonId,
    }

    fn fixture() -> Fixture {
        let mut data = Dataset::bootstrap();
        let group = data.create_group("Response Team", Some("RT".into()), None);
        let member_role = data.create_role(RoleDef {
            name: "Responder".into(),
            org: Org::Operations,
            priv_level: PrivLevel::Member,
            flags: RoleFlags::SHOW_ROSTER,
            ..RoleDef::default()
        });
        let lead_role = data.create_role(RoleDef {
            name: "Team Lead".into(),
            org: Org::Operations,
            priv_level: PrivLevel::Leader,
            ..RoleDef::default()
        });
        data.set_privileges(member_role, Privileges::MEMBER, group);
        data.set_privileges(
            lead_role,
            Privileges::LEADER_DEFAULT | Privileges::ASSIGN_ROLES,
            group,
        );
        data.add_implication(lead_role, member_role).unwrap();

        let member = data.add_person("Member");
        let lead = data.add_person("Lead");
        let outsider = data.add_person("Outsider");
        let root = data.add_person("Root");
        data.set_person_roles(member, &BTreeSet::from([member_role]));
        data.set_person_roles(lead, &BTreeSet::from([lead_role]));
        data.set_person_roles(root, &BTreeSet::from([WEBMASTER_ROLE]));

        let mut storage = MemStorage::default();
        materialize(&mut data, &mut storage).unwrap();

        Fixture {
            data,
            group,
            member_role,
            lead_role,
            member,
            lead,
            outsider,
            root,
        }
    }

    #[test]
    fn test_is_webmaster() {
        let f = fixture();
        assert!(is_webmaster(&f.data, f.root));
        assert!(!is_webmaster(&f.data, f.lead));
    }

    #[test]
    fn test_webmaster_bypasses_everything() {
        let f = fixture();
        assert!(can_view_person(&f.data, f.root, f.member));
        assert!(can_manage_event(&f.data, f.root, f.group));
        assert!(can_assign_role(&f.data, f.root, f.lead_role));
        assert!(can_send_texts(&f.data, f.root));
    }

    #[test]
    fn test_lead_can_view_and_manage_group_members() {
        let f = fixture();
        assert!(can_view_person(&f.data, f.lead, f.member));
        assert!(can_view_contact_info(&f.data, f.lead, f.member));
        assert!(can_manage_members(&f.data, f.lead, f.group));
        assert!(can_manage_event(&f.data, f.lead, f.group));
    }

    #[test]
    fn test_member_cannot_manage() {
        let f = fixture();
        assert!(!can_manage_members(&f.data, f.member, f.group));
        assert!(!can_manage_event(&f.data, f.member, f.group));
        assert!(!can_view_contact_info(&f.data, f.member, f.lead));
    }

    #[test]
    fn test_outsider_sees_nothing() {
        let f = fixture();
        assert!(!can_view_person(&f.data, f.outsider, f.member));
        assert!(!can_send_texts(&f.data, f.outsider));
        assert!(!can_assign_role(&f.data, f.outsider, f.member_role));
    }

    #[test]
    fn test_can_assign_role_requires_assign_on_membership_group() {
        let f = fixture();
        // The lead holds assign-role on the group both roles belong to.
        assert!(can_assign_role(&f.data, f.lead, f.member_role));
        assert!(can_assign_role(&f.data, f.lead, f.lead_role));
        assert!(!can_assign_role(&f.data, f.member, f.member_role));
    }

    #[test]
    fn test_can_send_texts_via_any_group() {
        let f = fixture();
        assert!(can_send_texts(&f.data, f.lead));
        assert!(!can_send_texts(&f.data, f.member));
    }

    #[test]
    fn test_roster_visibility() {
        let f = fixture();
        // Responder shows its roster: any member may look.
        assert!(can_view_roster(&f.data, f.member, f.member_role));
        // Team Lead does not: needs view-holders over the group.
        assert!(!can_view_roster(&f.data, f.member, f.lead_role));
        assert!(can_view_roster(&f.data, f.lead, f.lead_role));
        // No membership anywhere, no roster.
        assert!(!can_view_roster(&f.data, f.outsider, f.member_role));
    }

    #[test]
    fn test_is_disabled_tracks_disabled_role() {
        let mut data = Dataset::bootstrap();
        let p = data.add_person("Frozen");
        data.set_person_roles(p, &BTreeSet::from([DISABLED_ROLE]));
        let mut storage = MemStorage::default();
        materialize(&mut data, &mut storage).unwrap();
        assert!(is_disabled(&data, p));
    }

    #[test]
    fn test_queries_have_no_side_effects() {
        let f = fixture();
        let before = serde_json::to_string(&crate::storage::Snapshot::capture(&f.data)).unwrap();
        let _ = can_view_person(&f.data, f.lead, f.member);
        let _ = can_view_roster(&f.data, f.outsider, f.member_role);
        let after = serde_json::to_string(&crate::storage::Snapshot::capture(&f.data)).unwrap();
        let strip = |s: &str| s.split_once("\"roles\"").unwrap().1.to_owned();
        assert_eq!(strip(&before), strip(&after));
    }
}
