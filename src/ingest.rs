//! Alarm ingestion
//!
//! Alarms are deduplicated on (device, time, alarm code). A repeated alarm is
//! answered with the stored row, whose missing address may be backfilled. A
//! new alarm with coordinates but no address is enriched before insertion:
//! an address already known within a small box around the point is reused,
//! otherwise the reverse geocoder is asked when the alarm is recent enough.
//! Geocoding failures never fail the ingestion.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::GeocodingConfig;
use crate::errors::FleetError;
use crate::geocoding::ReverseGeocoder;
use crate::models::alarm::{Alarm, AlarmCode, NewAlarm};

/// Storage operations needed by ingestion
#[async_trait]
pub trait AlarmStore: Send + Sync {
    async fn device_exists(&self, imei: &str) -> Result<bool, FleetError>;

    async fn find_alarm(
        &self,
        imei: &str,
        time: i64,
        alarm_code: AlarmCode,
    ) -> Result<Option<Alarm>, FleetError>;

    /// Non-empty address of any alarm within `epsilon` degrees of the point
    async fn find_nearby_address(
        &self,
        lat: f64,
        lng: f64,
        epsilon: f64,
    ) -> Result<Option<String>, FleetError>;

    /// Insert unless an alarm with the same key exists, `None` in that case
    async fn insert_alarm(&self, alarm: &NewAlarm) -> Result<Option<Alarm>, FleetError>;

    async fn set_alarm_address(&self, id: i64, address: &str) -> Result<Alarm, FleetError>;
}

/// Outcome of an ingestion
#[derive(Debug, Clone, PartialEq)]
pub enum Ingestion {
    Created(Alarm),
    AlreadyReported(Alarm),
}

impl Ingestion {
    pub fn alarm(&self) -> &Alarm {
        match self {
            Ingestion::Created(alarm) | Ingestion::AlreadyReported(alarm) => alarm,
        }
    }

    pub fn into_alarm(self) -> Alarm {
        match self {
            Ingestion::Created(alarm) | Ingestion::AlreadyReported(alarm) => alarm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichmentSettings {
    /// Only alarms at most this many seconds old are sent to the geocoder
    pub recent_window: i64,
    /// Half side, in degrees, of the box searched for a known address
    pub nearby_epsilon: f64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            recent_window: 24 * 60 * 60,
            nearby_epsilon: 0.0001,
        }
    }
}

impl From<&GeocodingConfig> for EnrichmentSettings {
    fn from(config: &GeocodingConfig) -> Self {
        Self {
            recent_window: i64::try_from(config.recent_window.as_secs()).unwrap_or(i64::MAX),
            nearby_epsilon: config.nearby_epsilon,
        }
    }
}

impl EnrichmentSettings {
    /// Alarm time lies in the recency window and not in the future
    pub fn is_recent(&self, time: i64, now: i64) -> bool {
        time <= now && now - time <= self.recent_window
    }
}

pub struct AlarmIngestor<'a> {
    store: &'a dyn AlarmStore,
    geocoder: &'a dyn ReverseGeocoder,
    settings: EnrichmentSettings,
}

impl<'a> AlarmIngestor<'a> {
    pub fn new(
        store: &'a dyn AlarmStore,
        geocoder: &'a dyn ReverseGeocoder,
        settings: EnrichmentSettings,
    ) -> Self {
        Self {
            store,
            geocoder,
            settings,
        }
    }

    /// Ingest an alarm reported at `now` (seconds from Unix epoch)
    pub async fn ingest(&self, mut alarm: NewAlarm, now: i64) -> Result<Ingestion, FleetError> {
        alarm.validate()?;
        let imei = alarm.device_imei.to_string();

        if !self.store.device_exists(&imei).await? {
            return Err(FleetError::not_found("Device", &imei));
        }

        if let Some(existing) = self
            .store
            .find_alarm(&imei, alarm.time, alarm.alarm_code)
            .await?
        {
            debug!(
                "Alarm {} for device {} at {} already reported",
                alarm.alarm_code, imei, alarm.time
            );
            let existing = self.backfill(existing, now).await?;
            return Ok(Ingestion::AlreadyReported(existing));
        }

        if !alarm.has_address() {
            alarm.address = match alarm.coordinates() {
                Some((lat, lng)) => self.enrich(lat, lng, alarm.time, now).await?,
                None => None,
            };
        }

        match self.store.insert_alarm(&alarm).await? {
            Some(created) => {
                info!(
                    "Alarm {} stored for device {} (id {})",
                    created.alarm_code, imei, created.id
                );
                Ok(Ingestion::Created(created))
            }
            None => {
                // Lost an insert race against an identical alarm
                let winner = self
                    .store
                    .find_alarm(&imei, alarm.time, alarm.alarm_code)
                    .await?
                    .ok_or_else(|| {
                        FleetError::Conflict(format!(
                            "alarm {} for device {} at {} was not stored",
                            alarm.alarm_code, imei, alarm.time
                        ))
                    })?;
                let winner = match alarm.address.as_deref() {
                    Some(address) if !winner.has_address() => {
                        self.store.set_alarm_address(winner.id, address).await?
                    }
                    _ => winner,
                };
                Ok(Ingestion::AlreadyReported(winner))
            }
        }
    }

    /// Fill in the address of a stored alarm if it has coordinates but none
    async fn backfill(&self, alarm: Alarm, now: i64) -> Result<Alarm, FleetError> {
        if alarm.has_address() {
            return Ok(alarm);
        }
        let Some((lat, lng)) = alarm.coordinates() else {
            return Ok(alarm);
        };
        match self.enrich(lat, lng, alarm.time, now).await? {
            Some(address) => self.store.set_alarm_address(alarm.id, &address).await,
            None => Ok(alarm),
        }
    }

    /// Address for the point, `None` if neither known nor resolvable
    async fn enrich(
        &self,
        lat: f64,
        lng: f64,
        time: i64,
        now: i64,
    ) -> Result<Option<String>, FleetError> {
        if let Some(address) = self
            .store
            .find_nearby_address(lat, lng, self.settings.nearby_epsilon)
            .await?
        {
            debug!("Reusing known address near lat={}, lng={}", lat, lng);
            return Ok(Some(address));
        }

        if !self.settings.is_recent(time, now) {
            debug!("Alarm at {} is not recent, skipping reverse geocoding", time);
            return Ok(None);
        }

        match self.geocoder.reverse(lat, lng).await {
            Ok(address) => Ok(address),
            Err(e) => {
                warn!("Reverse geocoding lat={}, lng={} failed: {}", lat, lng, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::models::Imei;

    const IMEI: &str = "869066062080357";
    const NOW: i64 = 1_718_445_600;

    #[derive(Default)]
    struct MemoryStore {
        devices: HashSet<String>,
        alarms: Mutex<Vec<Alarm>>,
        /// Simulate a concurrent insert of the same alarm winning the race
        lose_race: bool,
    }

    impl MemoryStore {
        fn with_device(imei: &str) -> Self {
            Self {
                devices: HashSet::from([imei.to_string()]),
                ..Default::default()
            }
        }

        fn push(&self, alarm: &NewAlarm) -> Alarm {
            let mut alarms = self.alarms.lock().unwrap();
            let stored = Alarm {
                id: alarms.len() as i64 + 1,
                device_imei: alarm.device_imei.to_string(),
                lat: alarm.lat,
                lng: alarm.lng,
                time: alarm.time,
                address: alarm.address.clone().filter(|a| !a.trim().is_empty()),
                alarm_code: alarm.alarm_code,
                alarm_type: alarm.alarm_type,
                course: alarm.course,
                device_type: alarm.device_type,
                position_type: alarm.position_type.clone(),
                speed: alarm.speed,
            };
            alarms.push(stored.clone());
            stored
        }

        fn count(&self) -> usize {
            self.alarms.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AlarmStore for MemoryStore {
        async fn device_exists(&self, imei: &str) -> Result<bool, FleetError> {
            Ok(self.devices.contains(imei))
        }

        async fn find_alarm(
            &self,
            imei: &str,
            time: i64,
            alarm_code: AlarmCode,
        ) -> Result<Option<Alarm>, FleetError> {
            Ok(self
                .alarms
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.device_imei == imei && a.time == time && a.alarm_code == alarm_code)
                .cloned())
        }

        async fn find_nearby_address(
            &self,
            lat: f64,
            lng: f64,
            epsilon: f64,
        ) -> Result<Option<String>, FleetError> {
            Ok(self
                .alarms
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.has_address())
                .find(|a| match a.coordinates() {
                    Some((a_lat, a_lng)) => {
                        (a_lat - lat).abs() <= epsilon && (a_lng - lng).abs() <= epsilon
                    }
                    None => false,
                })
                .and_then(|a| a.address.clone()))
        }

        async fn insert_alarm(&self, alarm: &NewAlarm) -> Result<Option<Alarm>, FleetError> {
            if self.lose_race {
                let mut winner = alarm.clone();
                winner.address = None;
                self.push(&winner);
                return Ok(None);
            }
            Ok(Some(self.push(alarm)))
        }

        async fn set_alarm_address(&self, id: i64, address: &str) -> Result<Alarm, FleetError> {
            let mut alarms = self.alarms.lock().unwrap();
            let alarm = alarms
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| FleetError::not_found("Alarm", id))?;
            alarm.address = Some(address.to_string());
            Ok(alarm.clone())
        }
    }

    struct CountingGeocoder {
        calls: AtomicUsize,
        address: Option<&'static str>,
        fail: bool,
    }

    impl CountingGeocoder {
        fn answering(address: Option<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                address,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                address: None,
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReverseGeocoder for CountingGeocoder {
        async fn reverse(&self, _lat: f64, _lng: f64) -> Result<Option<String>, FleetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FleetError::Geocoding("connection refused".to_string()));
            }
            Ok(self.address.map(str::to_string))
        }
    }

    fn new_alarm(imei: &str, time: i64, coordinates: Option<(f64, f64)>) -> NewAlarm {
        NewAlarm {
            device_imei: Imei::try_from(imei).unwrap(),
            lat: coordinates.map(|c| c.0),
            lng: coordinates.map(|c| c.1),
            time,
            address: None,
            alarm_code: AlarmCode::Overspeed,
            alarm_type: 3,
            course: Some(90),
            device_type: 1,
            position_type: None,
            speed: Some(97),
        }
    }

    async fn ingest(
        store: &MemoryStore,
        geocoder: &CountingGeocoder,
        alarm: NewAlarm,
    ) -> Result<Ingestion, FleetError> {
        AlarmIngestor::new(store, geocoder, EnrichmentSettings::default())
            .ingest(alarm, NOW)
            .await
    }

    #[tokio::test]
    async fn test_duplicate_alarm_is_stored_once() {
        let store = MemoryStore::with_device(IMEI);
        let geocoder = CountingGeocoder::answering(Some("Av. Bolivar"));
        let alarm = new_alarm(IMEI, NOW - 60, Some((10.5, -66.9)));

        let first = ingest(&store, &geocoder, alarm.clone()).await.unwrap();
        let Ingestion::Created(created) = first else {
            panic!("first ingestion should create the alarm");
        };
        assert_eq!(created.address.as_deref(), Some("Av. Bolivar"));

        let second = ingest(&store, &geocoder, alarm).await.unwrap();
        assert_eq!(second, Ingestion::AlreadyReported(created));
        assert_eq!(store.count(), 1);
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_unregistered_device() {
        let store = MemoryStore::with_device(IMEI);
        let geocoder = CountingGeocoder::answering(None);
        let alarm = new_alarm("000000000000000", NOW, Some((10.0, -70.0)));

        let result = ingest(&store, &geocoder, alarm).await;
        assert!(matches!(result, Err(FleetError::NotFound { entity: "Device", .. })));
        assert_eq!(store.count(), 0);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_reuse_nearby_address() {
        let store = MemoryStore::with_device(IMEI);
        let mut known = new_alarm(IMEI, NOW - 3600, Some((10.00005, -70.00003)));
        known.address = Some("Calle X".to_string());
        known.alarm_code = AlarmCode::AccOff;
        store.push(&known);

        let geocoder = CountingGeocoder::answering(Some("Elsewhere"));
        let result = ingest(&store, &geocoder, new_alarm(IMEI, NOW, Some((10.0, -70.0))))
            .await
            .unwrap();

        assert_eq!(result.alarm().address.as_deref(), Some("Calle X"));
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_geocoding_failure_is_not_fatal() {
        let store = MemoryStore::with_device(IMEI);
        let geocoder = CountingGeocoder::failing();

        let result = ingest(&store, &geocoder, new_alarm(IMEI, NOW, Some((10.0, -70.0))))
            .await
            .unwrap();

        assert!(matches!(result, Ingestion::Created(_)));
        assert_eq!(result.alarm().address, None);
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_old_alarm_is_not_geocoded() {
        let store = MemoryStore::with_device(IMEI);
        let geocoder = CountingGeocoder::answering(Some("Calle Y"));
        let old = NOW - 2 * 24 * 60 * 60;

        let result = ingest(&store, &geocoder, new_alarm(IMEI, old, Some((10.0, -70.0))))
            .await
            .unwrap();
        assert_eq!(result.alarm().address, None);

        // Future timestamps are not geocoded either
        let result = ingest(&store, &geocoder, new_alarm(IMEI, NOW + 60, Some((10.0, -70.0))))
            .await
            .unwrap();
        assert_eq!(result.alarm().address, None);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_coordinates_no_enrichment() {
        let store = MemoryStore::with_device(IMEI);
        let geocoder = CountingGeocoder::answering(Some("Calle Y"));

        let result = ingest(&store, &geocoder, new_alarm(IMEI, NOW, None))
            .await
            .unwrap();
        assert!(matches!(result, Ingestion::Created(_)));
        assert_eq!(result.alarm().address, None);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_given_address_is_kept() {
        let store = MemoryStore::with_device(IMEI);
        let geocoder = CountingGeocoder::answering(Some("Calle Y"));
        let mut alarm = new_alarm(IMEI, NOW, Some((10.0, -70.0)));
        alarm.address = Some("Reported by tracker".to_string());

        let result = ingest(&store, &geocoder, alarm).await.unwrap();
        assert_eq!(result.alarm().address.as_deref(), Some("Reported by tracker"));
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_backfills_address() {
        let store = MemoryStore::with_device(IMEI);
        let alarm = new_alarm(IMEI, NOW - 60, Some((10.0, -70.0)));

        let failing = CountingGeocoder::failing();
        let first = ingest(&store, &failing, alarm.clone()).await.unwrap();
        assert_eq!(first.alarm().address, None);

        let geocoder = CountingGeocoder::answering(Some("Calle Z"));
        let second = ingest(&store, &geocoder, alarm).await.unwrap();
        let Ingestion::AlreadyReported(existing) = second else {
            panic!("second ingestion should report the stored alarm");
        };
        assert_eq!(existing.id, first.alarm().id);
        assert_eq!(existing.address.as_deref(), Some("Calle Z"));
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_lost_insert_race_reports_winner() {
        let store = MemoryStore {
            lose_race: true,
            ..MemoryStore::with_device(IMEI)
        };
        let geocoder = CountingGeocoder::answering(Some("Calle X"));

        let result = ingest(&store, &geocoder, new_alarm(IMEI, NOW, Some((10.0, -70.0))))
            .await
            .unwrap();
        let Ingestion::AlreadyReported(winner) = result else {
            panic!("losing the race should report the stored alarm");
        };
        assert_eq!(winner.address.as_deref(), Some("Calle X"));
        assert_eq!(store.count(), 1);
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_coordinates() {
        let store = MemoryStore::with_device(IMEI);
        let geocoder = CountingGeocoder::answering(None);

        let result = ingest(&store, &geocoder, new_alarm(IMEI, NOW, Some((95.0, -70.0)))).await;
        assert!(matches!(result, Err(FleetError::Validation(_))));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_recency_window() {
        let settings = EnrichmentSettings::default();
        assert!(settings.is_recent(NOW, NOW));
        assert!(settings.is_recent(NOW - 86_400, NOW));
        assert!(!settings.is_recent(NOW - 86_401, NOW));
        assert!(!settings.is_recent(NOW + 1, NOW));
    }
}
