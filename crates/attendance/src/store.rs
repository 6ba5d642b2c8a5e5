//! Policy store.
//!
//! Readers get a snapshot copy of an institution's settings; an update that
//! lands while a check is running is seen by the next check, not the current
//! one.

use crate::error::StoreError;
use crate::types::{Actor, InstitutionId, Role};
use geofence_core::{PolicyRecord, PolicyUpdate};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{info, warn};

/// Read access to institution geofence settings
pub trait PolicyStore: Send + Sync {
    /// Copy of the stored settings for `institution`
    fn snapshot(&self, institution: InstitutionId) -> Result<PolicyRecord, StoreError>;
}

/// In-memory policy store
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    records: RwLock<HashMap<InstitutionId, PolicyRecord>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an institution with its current settings
    pub fn insert(&self, institution: InstitutionId, record: PolicyRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        records.insert(institution, record);
        Ok(())
    }

    /// Apply an administrator's settings change.
    ///
    /// Only admins of the same institution may change settings. Returns the
    /// stored record after the change.
    pub fn apply_update(
        &self,
        actor: &Actor,
        institution: InstitutionId,
        update: &PolicyUpdate,
    ) -> Result<PolicyRecord, StoreError> {
        if actor.role != Role::Admin || actor.institution != institution {
            warn!(
                user = %actor.user_id,
                role = ?actor.role,
                %institution,
                "Rejected geolocation settings change"
            );
            return Err(StoreError::Forbidden { role: actor.role });
        }

        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let current = records
            .get(&institution)
            .ok_or(StoreError::InstitutionNotFound(institution))?;

        let updated = current.apply(update)?;
        records.insert(institution, updated.clone());

        info!(
            user = %actor.user_id,
            %institution,
            enabled = updated.geolocation_enabled,
            radius_m = ?updated.geolocation_radius,
            "Geolocation settings updated"
        );
        Ok(updated)
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn snapshot(&self, institution: InstitutionId) -> Result<PolicyRecord, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        records
            .get(&institution)
            .cloned()
            .ok_or(StoreError::InstitutionNotFound(institution))
    }
}
