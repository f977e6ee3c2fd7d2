//! `SeaORM` implementation of the `AttendanceService` trait.

use async_trait::async_trait;
use std::sync::Arc;

use crate::clock::Clock;
use crate::db::Store;
use crate::entities::attendance_records;
use crate::geo::haversine_distance_m;
use crate::services::attendance_service::{
    AttendanceError, AttendanceKind, AttendanceReceipt, AttendanceService,
};

pub struct SeaOrmAttendanceService {
    store: Store,
    clock: Arc<dyn Clock>,
}

impl SeaOrmAttendanceService {
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn record(
        &self,
        kind: AttendanceKind,
        user_id: i32,
        latitude: f64,
        longitude: f64,
        note: Option<String>,
    ) -> Result<AttendanceReceipt, AttendanceError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AttendanceError::UserNotFound)?;

        let office = self
            .store
            .get_office()
            .await?
            .ok_or(AttendanceError::OfficeNotConfigured)?;

        let distance_m =
            haversine_distance_m(latitude, longitude, office.latitude, office.longitude);

        // Boundary rule: exactly on the radius is accepted.
        if distance_m > office.radius_m {
            metrics::counter!("attendance_geofence_rejections_total").increment(1);
            tracing::info!(
                user_id,
                kind = kind.as_str(),
                distance_m,
                radius_m = office.radius_m,
                "Check rejected outside geofence"
            );
            return Err(AttendanceError::OutsideAllowedArea {
                distance_m,
                radius_m: office.radius_m,
            });
        }

        let recorded_at = self.clock.now().to_rfc3339();
        let row = self
            .store
            .insert_attendance(
                user_id,
                office.id,
                kind.as_str(),
                latitude,
                longitude,
                note.as_deref(),
                &recorded_at,
            )
            .await?;

        metrics::counter!("attendance_records_total", "kind" => kind.as_str()).increment(1);
        tracing::info!(user_id, kind = kind.as_str(), attendance_id = row.id, "Attendance recorded");

        Ok(AttendanceReceipt {
            attendance_id: row.id,
            recorded_at: row.recorded_at,
        })
    }
}

#[async_trait]
impl AttendanceService for SeaOrmAttendanceService {
    async fn check_in(
        &self,
        user_id: i32,
        latitude: f64,
        longitude: f64,
        note: Option<String>,
    ) -> Result<AttendanceReceipt, AttendanceError> {
        self.record(AttendanceKind::CheckIn, user_id, latitude, longitude, note)
            .await
    }

    async fn check_out(
        &self,
        user_id: i32,
        latitude: f64,
        longitude: f64,
        note: Option<String>,
    ) -> Result<AttendanceReceipt, AttendanceError> {
        self.record(AttendanceKind::CheckOut, user_id, latitude, longitude, note)
            .await
    }

    async fn history(
        &self,
        user_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<attendance_records::Model>, AttendanceError> {
        Ok(self.store.list_attendance(user_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::FixedClock;
    use chrono::Utc;

    // Seeded office from the initial migration.
    const OFFICE_LAT: f64 = -6.97321;
    const OFFICE_LON: f64 = 107.63014;

    async fn setup() -> (SeaOrmAttendanceService, Store, i32) {
        let store = Store::new("sqlite::memory:").await.expect("store");
        let admin = store
            .get_user_by_email("admin@hadir.local")
            .await
            .unwrap()
            .expect("seeded admin");
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = SeaOrmAttendanceService::new(store.clone(), clock);
        (service, store, admin.id)
    }

    #[tokio::test]
    async fn test_check_in_at_office_coordinates() {
        let (service, store, user_id) = setup().await;

        let receipt = service
            .check_in(user_id, OFFICE_LAT, OFFICE_LON, None)
            .await
            .expect("exact office position is inside any positive radius");
        assert!(receipt.attendance_id > 0);

        let rows = store.list_attendance(Some(user_id), 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "check-in");
        assert_eq!(rows[0].recorded_at, receipt.recorded_at);
    }

    #[tokio::test]
    async fn test_check_in_far_away_writes_no_record() {
        let (service, store, user_id) = setup().await;

        // ~1km north of the office, well past the 50m seed radius.
        let err = service
            .check_in(user_id, OFFICE_LAT + 0.009, OFFICE_LON, None)
            .await;
        match err {
            Err(AttendanceError::OutsideAllowedArea { distance_m, radius_m }) => {
                assert!(distance_m > 900.0 && distance_m < 1100.0, "got {distance_m}");
                assert_eq!(radius_m, 50.0);
            }
            other => panic!("expected geofence rejection, got {other:?}"),
        }

        let rows = store.list_attendance(Some(user_id), 10).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_boundary_distance_is_accepted() {
        let (service, store, user_id) = setup().await;

        // Pin the radius to the exact computed distance of a nearby
        // point, then check in from that point: d <= r must pass.
        let lat = OFFICE_LAT + 0.0004;
        let distance = crate::geo::haversine_distance_m(lat, OFFICE_LON, OFFICE_LAT, OFFICE_LON);
        store
            .update_office("Head Office", OFFICE_LAT, OFFICE_LON, distance)
            .await
            .unwrap();

        service
            .check_in(user_id, lat, OFFICE_LON, None)
            .await
            .expect("distance equal to radius is inside the fence");
    }

    #[tokio::test]
    async fn test_check_out_is_symmetric() {
        let (service, store, user_id) = setup().await;

        service
            .check_out(user_id, OFFICE_LAT, OFFICE_LON, Some("leaving early".into()))
            .await
            .unwrap();

        let err = service
            .check_out(user_id, OFFICE_LAT + 0.009, OFFICE_LON, None)
            .await;
        assert!(matches!(
            err,
            Err(AttendanceError::OutsideAllowedArea { .. })
        ));

        let rows = store.list_attendance(Some(user_id), 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "checkout");
        assert_eq!(rows[0].note.as_deref(), Some("leaving early"));
    }

    #[tokio::test]
    async fn test_no_pairing_between_checks() {
        let (service, _, user_id) = setup().await;

        // Two check-ins with no intervening check-out are both recorded.
        service
            .check_in(user_id, OFFICE_LAT, OFFICE_LON, None)
            .await
            .unwrap();
        service
            .check_in(user_id, OFFICE_LAT, OFFICE_LON, None)
            .await
            .unwrap();

        let rows = service.history(Some(user_id), 10).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        let (service, _, _) = setup().await;

        let err = service.check_in(4242, OFFICE_LAT, OFFICE_LON, None).await;
        assert!(matches!(err, Err(AttendanceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_missing_office_is_a_configuration_error() {
        use crate::entities::locations;
        use sea_orm::EntityTrait;

        let (service, store, user_id) = setup().await;

        locations::Entity::delete_many()
            .exec(&store.conn)
            .await
            .unwrap();

        let err = service.check_in(user_id, OFFICE_LAT, OFFICE_LON, None).await;
        assert!(matches!(err, Err(AttendanceError::OfficeNotConfigured)));
    }
}
