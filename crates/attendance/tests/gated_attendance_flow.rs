//! Integration tests for geofence-gated attendance
//!
//! These tests verify end-to-end scenarios including:
//! - Admin configures the geofence, teacher records from inside it
//! - Teacher outside the radius is refused with a readable report
//! - Settings changes apply to the next check, not to earlier snapshots
//! - Concurrent teachers sharing one gate

use chrono::{NaiveDate, Utc};
use geofence_acquisition::{PositionAcquirer, ScriptedSource};
use geofence_attendance::{
    Actor, AttendanceBook, AttendanceEntry, AttendanceGate, AttendanceStatus, GateDecision,
    GateError, InMemoryPolicyStore, InstitutionId, PolicyStore,
};
use geofence_core::{
    AcquisitionConfig, GeoCoordinate, PolicyRecord, PolicyUpdate, PositionSample,
    RawPositionSample,
};
use std::sync::Arc;
use std::time::Duration;

const INSTITUTION: InstitutionId = InstitutionId(1);

fn setup() -> (Arc<InMemoryPolicyStore>, AttendanceBook<InMemoryPolicyStore>) {
    let store = Arc::new(InMemoryPolicyStore::new());
    store.insert(INSTITUTION, PolicyRecord::default()).unwrap();
    store
        .apply_update(
            &Actor::admin(1, 1),
            INSTITUTION,
            &PolicyUpdate::enable(GeoCoordinate::new(41.3111, 69.2797).unwrap(), 200.0),
        )
        .unwrap();
    let book = AttendanceBook::new(AttendanceGate::new(Arc::clone(&store)));
    (store, book)
}

fn entry(student_id: u64) -> AttendanceEntry {
    AttendanceEntry {
        student_id,
        group: "AT-22".to_string(),
        subject: "Databases".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 10, 7).unwrap(),
        status: AttendanceStatus::Present,
    }
}

fn raw(lat: f64, lon: f64) -> RawPositionSample {
    RawPositionSample {
        latitude: lat,
        longitude: lon,
        accuracy_meters: Some(20.0),
        captured_at: Utc::now(),
    }
}

#[tokio::test(start_paused = true)]
async fn teacher_records_with_acquired_fix() {
    let (_store, book) = setup();

    let source = ScriptedSource::from_samples(
        vec![
            PositionSample::new(41.35, 69.30, Some(3_000.0), Utc::now()).unwrap(),
            PositionSample::new(41.3113, 69.2799, Some(30.0), Utc::now()).unwrap(),
        ],
        Duration::from_secs(1),
    );
    let fix = PositionAcquirer::new(AcquisitionConfig::default())
        .unwrap()
        .acquire(&source)
        .await
        .unwrap();
    let location = fix.trusted_sample().map(PositionSample::to_raw);

    let record = book
        .record(&Actor::teacher(7, 1), entry(100), location.as_ref())
        .unwrap();

    let stamp = record.location.expect("geofenced record carries a stamp");
    assert_eq!(stamp.accuracy_meters, Some(30.0));
    assert!(stamp.distance_meters < 200.0);
}

#[test]
fn teacher_outside_radius_is_refused() {
    let (_store, book) = setup();

    let err = book
        .record(&Actor::teacher(7, 1), entry(100), Some(&raw(41.3150, 69.2797)))
        .unwrap_err();

    match &err {
        GateError::OutsideRadius(report) => {
            assert_eq!(report.allowed_radius_m, 200.0);
            assert_eq!(report.distance_m, 434.0);
            assert_eq!(report.shortfall_m, 234.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Outside the permitted area. You are 434 m away, but only 200 m is permitted."
    );
    assert!(book.list(INSTITUTION, None).unwrap().is_empty());
}

#[test]
fn disabling_the_geofence_applies_to_next_check() {
    let (store, book) = setup();
    let teacher = Actor::teacher(7, 1);
    let before = store.snapshot(INSTITUTION).unwrap();

    assert!(book.record(&teacher, entry(100), None).is_err());

    store
        .apply_update(&Actor::admin(1, 1), INSTITUTION, &PolicyUpdate::disable())
        .unwrap();

    let record = book.record(&teacher, entry(100), None).unwrap();
    assert!(record.location.is_none());
    // the snapshot taken earlier still reflects the old settings
    assert!(before.geolocation_enabled);
}

#[test]
fn admin_records_without_location() {
    let (_store, book) = setup();
    let record = book.record(&Actor::admin(1, 1), entry(100), None).unwrap();
    assert_eq!(record.recorded_by, geofence_attendance::UserId(1));
    assert_eq!(
        book.gate().admit(&Actor::admin(1, 1), None).unwrap(),
        GateDecision::Exempt
    );
}

#[test]
fn concurrent_teachers_share_one_book() {
    let (_store, book) = setup();
    let book = Arc::new(book);

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let book = Arc::clone(&book);
            std::thread::spawn(move || {
                book.record(
                    &Actor::teacher(10 + i, 1),
                    entry(200 + i),
                    Some(&raw(41.3112, 69.2797)),
                )
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }

    let records = book.list(INSTITUTION, None).unwrap();
    assert_eq!(records.len(), 8);
    let mut ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
