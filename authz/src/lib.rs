//! Authorization engine for the volunteer-organization portal.
//!
//! Holds who-may-do-what in two bit-packed matrices (person-role membership
//! and role-group privileges), derives transitive role implications,
//! per-organization privilege levels, and mailing-list membership from the
//! administrator-set primary facts, and answers the privilege predicates the
//! portal's request handlers gate on.
//!
//! The engine is synchronous and purely in-memory once loaded; persistence,
//! transactions, and audit-text formatting belong to the surrounding portal
//! (see [`storage::Storage`]).

pub mod closure;
pub mod dataset;
pub mod error;
pub mod materialize;
pub mod matrix;
pub mod models;
pub mod privileges;
pub mod queries;
pub mod storage;
pub mod store;

pub use dataset::{Dataset, RoleDef};
pub use error::AuthzError;
pub use materialize::materialize;
pub use models::{
    Group, GroupId, List, ListFlags, ListId, ListKind, ListLink, Person, PersonId, Provenance,
    Role, RoleFlags, RoleId, SubscriptionModel, DISABLED_ROLE, WEBMASTER_ROLE,
};
pub use privileges::{Org, PrivLevel, Privileges};
pub use storage::{MemStorage, Snapshot, Storage};
pub use store::{AuthStore, PrivilegeChange, RoleChange};
