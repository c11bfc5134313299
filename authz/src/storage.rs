//! The storage-collaborator seam.
//!
//! The engine never talks to a database or filesystem itself: it loads a
//! [`Dataset`], computes on it, and hands it back. The collaborator owns
//! atomicity (one pass's writes either all land or none do) and its
//! retry-on-conflict discipline, neither of which this crate knows about.
//! The packed matrices cross the seam only as an opaque byte buffer.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::dataset::Dataset;
use crate::models::{List, Person, Role};
use crate::store::AuthStore;

/// Pre-change clones of every role, list, and person, captured before the
/// materializer mutates anything. The surrounding system diffs this against
/// post-pass state to produce audit records; the engine never formats audit
/// text itself.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub roles: Vec<Role>,
    pub lists: Vec<List>,
    pub people: Vec<Person>,
}

impl Snapshot {
    /// Clone the audit-relevant records out of a dataset.
    #[must_use]
    pub fn capture(data: &Dataset) -> Self {
        Self {
            taken_at: Utc::now(),
            roles: data.roles().cloned().collect(),
            lists: data.lists().cloned().collect(),
            people: data.people().to_vec(),
        }
    }
}

/// Persistence collaborator for the authorization state.
///
/// Implementations are expected to wrap each [`Storage::persist`] in their
/// own all-or-nothing transaction and to serialize materialization passes;
/// the engine performs no partial commits and has no rollback of its own.
pub trait Storage {
    /// Load the full authorization state.
    fn load(&mut self) -> Result<Dataset>;

    /// Capture the pre-change state for audit diffing. Called once per
    /// materialization pass, before any record is mutated.
    fn snapshot(&mut self) -> Result<Snapshot>;

    /// Persist every role, group, list, and person plus the packed store.
    fn persist(&mut self, data: &Dataset) -> Result<()>;
}

/// In-memory [`Storage`] implementation.
///
/// Used by the test suite and by deployments that keep the dataset resident
/// and persist elsewhere. The packed store round-trips through its opaque
/// byte form on every persist/load, so the serialized format is exercised on
/// the same path a durable backend would use.
#[derive(Debug, Default)]
pub struct MemStorage {
    saved: Option<Dataset>,
    packed: Vec<u8>,
}

impl Storage for MemStorage {
    fn load(&mut self) -> Result<Dataset> {
        let Some(saved) = &self.saved else {
            info!("no saved authorization state, starting from bootstrap");
            return Ok(Dataset::bootstrap());
        };
        let store = AuthStore::from_bytes(&self.packed)?;
        let mut data = saved.clone();
        data.store = store;
        Ok(data)
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        Ok(match &self.saved {
            Some(saved) => Snapshot::capture(saved),
            None => Snapshot {
                taken_at: Utc::now(),
                roles: Vec::new(),
                lists: Vec::new(),
                people: Vec::new(),
            },
        })
    }

    fn persist(&mut self, data: &Dataset) -> Result<()> {
        self.packed = data.store().to_bytes();
        self.saved = Some(data.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::dataset::RoleDef;
    use crate::privileges::{Org, PrivLevel, Privileges};

    #[test]
    fn test_mem_storage_load_bootstraps_when_empty() {
        let mut storage = MemStorage::default();
        let data = storage.load().unwrap();
        assert_eq!(data.roles().count(), 2);
    }

    #[test]
    fn test_mem_storage_roundtrips_packed_store() {
        let mut storage = MemStorage::default();
        let mut data = storage.load().unwrap();
        let role = data.create_role(RoleDef {
            name: "Courier".into(),
            org: Org::Logistics,
            priv_level: PrivLevel::Member,
            ..RoleDef::default()
        });
        let group = data.create_group("Depot", None, None);
        data.set_privileges(role, Privileges::MEMBER, group);
        let p = data.add_person("Noor");
        data.set_person_roles(p, &BTreeSet::from([role]));

        storage.persist(&data).unwrap();
        let reloaded = storage.load().unwrap();

        assert_eq!(reloaded, data);
        assert!(reloaded.store().person_holds(p, role));
        assert_eq!(reloaded.store().privileges(role, group), Privileges::MEMBER);
    }

    #[test]
    fn test_snapshot_reflects_saved_state_not_working_copy() {
        let mut storage = MemStorage::default();
        let mut data = storage.load().unwrap();
        let p = data.add_person("Ira");
        storage.persist(&data).unwrap();

        // Mutate the working copy without persisting.
        data.add_person("Not Saved");

        let snap = storage.snapshot().unwrap();
        assert_eq!(snap.people.len(), 1);
        assert_eq!(snap.people[0].id, p);
    }

    #[test]
    fn test_snapshot_serializes() {
        let data = Dataset::bootstrap();
        let snap = Snapshot::capture(&data);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("Webmaster"));
        assert!(json.contains("taken_at"));
    }
}
