//! Attendance records guarded by the geofence gate.

use crate::error::{GateError, GateResult};
use crate::gate::{AttendanceGate, GateDecision, LocationStamp};
use crate::store::PolicyStore;
use crate::types::{Actor, InstitutionId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use geofence_core::RawPositionSample;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    #[default]
    Absent,
    Late,
}

/// What a teacher submits for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub student_id: u64,
    pub group: String,
    pub subject: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: AttendanceStatus,
}

/// A stored attendance record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: u64,
    pub institution: InstitutionId,
    pub student_id: u64,
    pub group: String,
    pub subject: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub recorded_by: UserId,
    /// Where the recording teacher was, when the geofence applied
    pub location: Option<LocationStamp>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One record per student, group, subject and day within an institution
type RecordKey = (InstitutionId, u64, String, NaiveDate, String);

#[derive(Debug, Default)]
struct BookState {
    next_id: u64,
    records: HashMap<RecordKey, AttendanceRecord>,
}

/// In-memory attendance book
pub struct AttendanceBook<S: PolicyStore + ?Sized> {
    gate: AttendanceGate<S>,
    state: RwLock<BookState>,
}

impl<S: PolicyStore + ?Sized> AttendanceBook<S> {
    pub fn new(gate: AttendanceGate<S>) -> Self {
        Self {
            gate,
            state: RwLock::new(BookState::default()),
        }
    }

    pub fn gate(&self) -> &AttendanceGate<S> {
        &self.gate
    }

    /// Record attendance for one student.
    ///
    /// The gate runs first; nothing is written unless it admits. An existing
    /// record for the same student, group, subject and day is updated in place.
    pub fn record(
        &self,
        actor: &Actor,
        entry: AttendanceEntry,
        location: Option<&RawPositionSample>,
    ) -> GateResult<AttendanceRecord> {
        let decision = self.gate.admit(actor, location)?;
        let stamp = decision.stamp().copied();

        let mut state = self
            .state
            .write()
            .map_err(|e| GateError::Unavailable(e.to_string()))?;
        let now = Utc::now();
        let key = (
            actor.institution,
            entry.student_id,
            entry.group.clone(),
            entry.date,
            entry.subject.clone(),
        );

        if let Some(existing) = state.records.get_mut(&key) {
            existing.status = entry.status;
            existing.recorded_by = actor.user_id;
            existing.location = stamp.or(existing.location);
            existing.updated_at = Some(now);
            info!(
                id = existing.id,
                student_id = existing.student_id,
                status = ?existing.status,
                "Attendance updated"
            );
            return Ok(existing.clone());
        }

        state.next_id += 1;
        let record = AttendanceRecord {
            id: state.next_id,
            institution: actor.institution,
            student_id: entry.student_id,
            group: entry.group,
            subject: entry.subject,
            date: entry.date,
            status: entry.status,
            recorded_by: actor.user_id,
            location: stamp,
            created_at: now,
            updated_at: None,
        };
        info!(
            id = record.id,
            student_id = record.student_id,
            status = ?record.status,
            geofenced = matches!(decision, GateDecision::Admitted { .. }),
            "Attendance recorded"
        );
        state.records.insert(key, record.clone());
        Ok(record)
    }

    /// Records of an institution, optionally for one day, ordered by id
    pub fn list(
        &self,
        institution: InstitutionId,
        date: Option<NaiveDate>,
    ) -> GateResult<Vec<AttendanceRecord>> {
        let state = self
            .state
            .read()
            .map_err(|e| GateError::Unavailable(e.to_string()))?;
        let mut records: Vec<AttendanceRecord> = state
            .records
            .values()
            .filter(|r| r.institution == institution)
            .filter(|r| date.map_or(true, |d| r.date == d))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}
