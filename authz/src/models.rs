//! Records and relations of the authorization engine.
//!
//! Primary facts (names, flags, direct implications, list links, direct role
//! grants) are edited through [`crate::dataset::Dataset`]; every derived field
//! (indirect entries, reverse rosters, per-organization records, computed list
//! bits) is owned and overwritten by the materializer and must not be edited
//! anywhere else.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::privileges::{Org, PrivLevel};

/// Role identity: a slot index into the packed matrices.
///
/// Slots of deleted roles are reused; treat values as opaque.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoleId(pub u32);

/// Group identity: a slot index into the privilege matrix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GroupId(pub u32);

/// Person identity: a row index into the membership matrix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersonId(pub u32);

/// List identity. Never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ListId(pub u32);

/// The webmaster role, seeded at bootstrap. Its holders bypass every
/// privilege predicate.
pub const WEBMASTER_ROLE: RoleId = RoleId(0);

/// The disabled-login role, seeded at bootstrap. Its holders contribute
/// nothing to per-organization levels and are excluded from list computation.
pub const DISABLED_ROLE: RoleId = RoleId(1);

/// How an entry got into an implies or holds relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Configured by an administrator.
    Direct,
    /// Derived by the materializer. Dropped and recomputed on every pass.
    Indirect,
}

impl Provenance {
    /// True for administrator-configured entries.
    #[must_use]
    pub const fn is_direct(self) -> bool {
        matches!(self, Self::Direct)
    }
}

bitflags! {
    /// Role behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct RoleFlags: u8 {
        /// The role's holder list is visible to ordinary members.
        const SHOW_ROSTER   = 1 << 0;
        /// The role cannot be held directly, only arrived at through
        /// implication.
        const IMPLICIT_ONLY = 1 << 1;
    }
}

impl Default for RoleFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Per-person status bits on a list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct ListFlags: u8 {
        /// Explicitly unsubscribed. Manual and durable: survives every
        /// recompute until the person resubscribes.
        const UNSUBSCRIBED = 1 << 0;
        /// Receives the list's traffic. Computed, except that on opt-in
        /// lists a manually set bit is preserved across recomputes.
        const SUBSCRIBED   = 1 << 1;
        /// May post to the list. Computed.
        const SENDER       = 1 << 2;
    }
}

impl Default for ListFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// How a role-to-list association affects computed subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionModel {
    /// Holding the role gives no path onto the list.
    #[default]
    None,
    /// Holders may opt in; the materializer preserves a manual subscription
    /// but never creates one.
    OptIn,
    /// Holders are subscribed automatically.
    Automatic,
    /// Holders are subscribed automatically and the portal warns them about
    /// the traffic they will receive.
    AutomaticWarned,
}

/// A role's association with a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLink {
    /// Subscription model applied to the role's holders.
    pub model: SubscriptionModel,
    /// Whether holders may post to the list.
    pub sender: bool,
}

/// A named grant unit. May be held by people and may imply other roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Display title adopted by holders in the role's organization.
    pub title: Option<String>,
    pub org: Org,
    /// Base privilege tier contributed to holders in `org`.
    pub priv_level: PrivLevel,
    pub flags: RoleFlags,
    /// Ordering weight; lower sorts first. Ties break on role identity.
    pub priority: i32,
    /// Roles conferred by holding this one. Indirect entries are derived.
    pub implies: BTreeMap<RoleId, Provenance>,
    /// Lists the role's holders are routed onto.
    pub lists: BTreeMap<ListId, ListLink>,
    /// People holding the role, directly or indirectly. Derived.
    pub people: Vec<PersonId>,
}

impl Role {
    /// True if the role cannot be held directly.
    #[must_use]
    pub const fn is_implicit_only(&self) -> bool {
        self.flags.contains(RoleFlags::IMPLICIT_ONLY)
    }

    /// True if the role's holder list is visible to ordinary members.
    #[must_use]
    pub const fn shows_roster(&self) -> bool {
        self.flags.contains(RoleFlags::SHOW_ROSTER)
    }
}

/// The unit on which privileges are granted to roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Short tag used in rosters and exports.
    pub tag: Option<String>,
    /// Group email address, if the group fronts a mailbox.
    pub email: Option<String>,
}

/// Per-organization standing, recomputed on every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRecord {
    /// Highest base tier among the organization's roles the person holds.
    pub level: PrivLevel,
    /// Title adopted from the highest-priority titled role.
    pub title: Option<String>,
}

/// A person known to the portal. Only the authorization-relevant fields
/// live here; profile data is the portal's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub informal_name: String,
    /// Roles held. Indirect entries are derived.
    pub roles: BTreeMap<RoleId, Provenance>,
    /// Direct roles in display order (priority, then identity). Derived.
    pub sorted_roles: Vec<RoleId>,
    /// One record per organization, indexed by [`Org::index`]. Derived.
    pub orgs: [OrgRecord; Org::COUNT],
}

impl Person {
    /// True if the person holds the role, directly or indirectly.
    #[must_use]
    pub fn holds(&self, role: RoleId) -> bool {
        self.roles.contains_key(&role)
    }

    /// True if the person holds the role directly.
    #[must_use]
    pub fn holds_directly(&self, role: RoleId) -> bool {
        self.roles.get(&role).is_some_and(|p| p.is_direct())
    }

    /// True if the person's login is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.holds(DISABLED_ROLE)
    }
}

/// List transport kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Email,
    Sms,
}

/// A mailing or text-message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub kind: ListKind,
    pub name: String,
    /// Per-person status. Entries with no bits set are dropped.
    pub people: BTreeMap<PersonId, ListFlags>,
}

impl List {
    /// People currently receiving the list's traffic.
    pub fn subscribers(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.people
            .iter()
            .filter(|(_, f)| f.contains(ListFlags::SUBSCRIBED))
            .map(|(&p, _)| p)
    }

    /// People allowed to post to the list.
    pub fn senders(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.people
            .iter()
            .filter(|(_, f)| f.contains(ListFlags::SENDER))
            .map(|(&p, _)| p)
    }
}
