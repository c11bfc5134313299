//! Privilege vocabulary, privilege tiers, and the organization roster.
//!
//! The privilege set is fixed at build time. Adding a new privilege means
//! reserving an unused bit here, which is a breaking change to the packed
//! store's serialized form if the bit width has to grow.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Privileges a role can hold on a group, as a 32-bit bitfield.
    ///
    /// One mask is stored per (role, group) cell of the packed store.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct Privileges: u32 {
        /// Membership in the group. Every other privilege acts *on* the
        /// people this bit gathers.
        const MEMBER            = 1 << 0;
        /// Grant and revoke roles whose holders belong to the group.
        const ASSIGN_ROLES      = 1 << 1;
        /// Create, edit, and cancel the group's events.
        const MANAGE_EVENTS     = 1 << 2;
        /// Edit membership records of people in the group.
        const MANAGE_MEMBERS    = 1 << 3;
        /// See who belongs to the group.
        const VIEW_HOLDERS      = 1 << 4;
        /// See contact details of people in the group.
        const VIEW_CONTACT_INFO = 1 << 5;
        /// Send text messages to people in the group.
        const SEND_TEXTS        = 1 << 6;
    }
}

impl Privileges {
    /// Privileges granted to a group's ordinary members by convention.
    pub const MEMBER_DEFAULT: Self = Self::MEMBER;

    /// Privileges a group leader typically holds on their own group.
    pub const LEADER_DEFAULT: Self = Self::MEMBER
        .union(Self::MANAGE_EVENTS)
        .union(Self::MANAGE_MEMBERS)
        .union(Self::VIEW_HOLDERS)
        .union(Self::VIEW_CONTACT_INFO)
        .union(Self::SEND_TEXTS);

    /// Check if this privilege set includes the specified privilege(s).
    ///
    /// Requires ALL bits of `required` to be present.
    ///
    /// # Examples
    ///
    /// ```
    /// use vp_authz::Privileges;
    ///
    /// let privs = Privileges::MEMBER | Privileges::VIEW_HOLDERS;
    /// assert!(privs.has(Privileges::MEMBER));
    /// assert!(!privs.has(Privileges::SEND_TEXTS));
    /// ```
    #[must_use]
    pub const fn has(self, required: Self) -> bool {
        self.contains(required)
    }
}

impl Default for Privileges {
    fn default() -> Self {
        Self::empty()
    }
}

/// Ordered privilege tier used for per-organization aggregation.
///
/// A person's tier in an organization is the maximum base tier among the
/// roles they hold there.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PrivLevel {
    /// No standing in the organization.
    #[default]
    None,
    /// Applied but not yet accepted.
    Applicant,
    /// Accepted member.
    Member,
    /// Leadership tier.
    Leader,
}

/// The portal's organizations. A role belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Org {
    Administration,
    Communications,
    Logistics,
    Operations,
    Outreach,
    Training,
}

impl Org {
    /// Number of organizations; sizes per-person aggregation arrays.
    pub const COUNT: usize = 6;

    /// Returns all organizations as a slice.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Administration,
            Self::Communications,
            Self::Logistics,
            Self::Operations,
            Self::Outreach,
            Self::Training,
        ]
    }

    /// Stable index into per-person aggregation arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Administration => 0,
            Self::Communications => 1,
            Self::Logistics => 2,
            Self::Operations => 3,
            Self::Outreach => 4,
            Self::Training => 5,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Administration => "Administration",
            Self::Communications => "Communications",
            Self::Logistics => "Logistics",
            Self::Operations => "Operations",
            Self::Outreach => "Outreach",
            Self::Training => "Training",
        }
    }
}
