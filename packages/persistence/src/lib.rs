#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Durable storage and retrieval of the mangrove reference collection.
//!
//! [`DataService`] owns the serialized `GeoJSON` collection in a single
//! named storage slot, behind the [`slot::SlotStore`] abstraction, with a
//! placeholder remote backend behind [`remote::RemoteStore`]. The service
//! is constructor-injected; there is no global instance, so tests run
//! against isolated in-memory storage.
//!
//! Reads never fail: an absent or unreadable slot yields the empty
//! collection (the parse failure is logged, not surfaced). Writes surface
//! structured errors and are never retried automatically.

pub mod remote;
pub mod slot;

use std::sync::Arc;

use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::remote::{RemoteError, RemoteStore};
use crate::slot::{SlotError, SlotStore};

/// Errors that can occur during persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Store(#[from] SlotError),

    /// Serializing the collection failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The remote backend failed.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Which backend the service currently reads from and writes to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum StorageMode {
    /// The local single-slot store.
    #[serde(rename = "Local Storage")]
    #[strum(serialize = "Local Storage")]
    LocalStorage,
    /// The remote backend.
    #[serde(rename = "Firebase")]
    #[strum(serialize = "Firebase")]
    Firebase,
}

/// Narrowing criteria for [`DataService::get_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Case-insensitive substring match on the `state` property.
    pub state: Option<String>,
}

impl Filters {
    /// Whether a feature passes the filter. Features without a `state`
    /// property fail any state filter.
    #[must_use]
    pub fn matches(&self, feature: &geojson::Feature) -> bool {
        let Some(wanted) = &self.state else {
            return true;
        };
        feature
            .properties
            .as_ref()
            .and_then(|props| props.get("state"))
            .and_then(serde_json::Value::as_str)
            .is_some_and(|state| state.to_lowercase().contains(&wanted.to_lowercase()))
    }
}

/// Aggregate statistics over the stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStats {
    /// Number of stored features.
    pub total_features: usize,
    /// Deduplicated `state` property values, in first-seen order.
    pub states: Vec<String>,
    /// Current storage mode.
    pub storage_mode: StorageMode,
}

/// Result of a [`DataService::migrate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The service was already in remote mode; nothing was done.
    AlreadyRemote,
    /// The remote write succeeded and the mode flag flipped.
    Migrated {
        /// Number of features written to the remote backend.
        features_moved: usize,
    },
    /// The remote backend did not accept the write; the mode flag is
    /// unchanged and local data is untouched.
    RemoteRejected {
        /// Human-readable reason from the backend.
        reason: String,
    },
}

/// An empty `FeatureCollection`.
#[must_use]
pub fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}

/// The persistence service over a local slot store and a remote backend.
pub struct DataService {
    local: Arc<dyn SlotStore>,
    remote: Arc<dyn RemoteStore>,
    mode: StorageMode,
}

impl DataService {
    /// Creates a service in local-storage mode.
    #[must_use]
    pub const fn new(local: Arc<dyn SlotStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            local,
            remote,
            mode: StorageMode::LocalStorage,
        }
    }

    /// The current storage mode.
    #[must_use]
    pub const fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Returns the stored collection, optionally narrowed by `filters`.
    ///
    /// Never fails: an empty slot, an unreadable backend, or malformed
    /// stored data all yield the empty collection. Malformed data is
    /// logged so the degradation is observable.
    pub async fn get_data(&self, filters: &Filters) -> FeatureCollection {
        let mut collection = match self.mode {
            StorageMode::LocalStorage => self.load_local().await,
            StorageMode::Firebase => match self.remote.fetch(filters).await {
                Ok(collection) => return collection,
                Err(error) => {
                    log::warn!("Remote fetch failed, returning empty collection: {error}");
                    return empty_collection();
                }
            },
        };

        if filters.state.is_some() {
            collection
                .features
                .retain(|feature| filters.matches(feature));
        }
        collection
    }

    /// Appends `new_data.features` onto the stored collection and persists
    /// the result. No deduplication, no reordering.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend rejects the write (e.g.
    /// quota exceeded). The stored data is unchanged in that case.
    pub async fn save_data(&self, new_data: &FeatureCollection) -> Result<(), PersistenceError> {
        match self.mode {
            StorageMode::LocalStorage => {
                let mut merged = self.load_local().await;
                merged.features.extend(new_data.features.iter().cloned());

                let serialized = serde_json::to_string(&merged)?;
                self.local.write(&serialized).await?;
                log::debug!(
                    "Saved {} features ({} new)",
                    merged.features.len(),
                    new_data.features.len()
                );
                Ok(())
            }
            StorageMode::Firebase => {
                self.remote.bulk_write(new_data).await?;
                Ok(())
            }
        }
    }

    /// Returns the stored features within `radius_km` of `(lat, lng)`.
    ///
    /// A flat linear scan: point features are kept by haversine distance,
    /// polygon features by containment or boundary distance. Features
    /// without a geometry are dropped.
    pub async fn get_by_location(&self, lat: f64, lng: f64, radius_km: f64) -> FeatureCollection {
        if self.mode == StorageMode::Firebase {
            return match self.remote.query_radius(lat, lng, radius_km).await {
                Ok(collection) => collection,
                Err(error) => {
                    log::warn!("Remote location query failed, returning empty collection: {error}");
                    empty_collection()
                }
            };
        }

        let mut collection = self.load_local().await;
        collection.features.retain(|feature| {
            feature.geometry.as_ref().is_some_and(|geometry| {
                mangrove_map_spatial::within_radius(lat, lng, geometry, radius_km)
            })
        });
        collection
    }

    /// Deletes all stored data unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the local backend cannot delete the
    /// slot.
    pub async fn clear(&self) -> Result<(), PersistenceError> {
        match self.mode {
            StorageMode::LocalStorage => {
                self.local.remove().await?;
                log::info!("Cleared stored mangrove data");
                Ok(())
            }
            StorageMode::Firebase => {
                // No remote transport exists; nothing to delete there yet.
                log::warn!("Remote clear not implemented");
                Ok(())
            }
        }
    }

    /// Returns aggregate statistics over the stored collection.
    pub async fn get_stats(&self) -> DataStats {
        let collection = self.get_data(&Filters::default()).await;

        let mut states: Vec<String> = Vec::new();
        for feature in &collection.features {
            let Some(state) = feature
                .properties
                .as_ref()
                .and_then(|props| props.get("state"))
                .and_then(serde_json::Value::as_str)
            else {
                continue;
            };
            if !states.iter().any(|seen| seen == state) {
                states.push(state.to_string());
            }
        }

        DataStats {
            total_features: collection.features.len(),
            states,
            storage_mode: self.mode,
        }
    }

    /// Attempts a one-way migration of the local data to the remote
    /// backend.
    ///
    /// The mode flag flips to [`StorageMode::Firebase`] only when the
    /// remote bulk write actually succeeds; a rejected write leaves the
    /// service in local mode with its data untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the local data cannot be read.
    /// Remote rejection is not an error; it is reported as
    /// [`MigrationOutcome::RemoteRejected`].
    pub async fn migrate(&mut self) -> Result<MigrationOutcome, PersistenceError> {
        if self.mode == StorageMode::Firebase {
            log::info!("Already in remote mode");
            return Ok(MigrationOutcome::AlreadyRemote);
        }

        let local_data = self.load_local().await;
        let features_moved = local_data.features.len();

        match self.remote.bulk_write(&local_data).await {
            Ok(()) => {
                self.mode = StorageMode::Firebase;
                log::info!("Migrated {features_moved} features to the remote backend");
                Ok(MigrationOutcome::Migrated { features_moved })
            }
            Err(error) => {
                log::warn!("Migration rejected by remote backend, staying local: {error}");
                Ok(MigrationOutcome::RemoteRejected {
                    reason: error.to_string(),
                })
            }
        }
    }

    /// Loads the local slot; absent or corrupt contents yield the empty
    /// collection.
    async fn load_local(&self) -> FeatureCollection {
        let contents = match self.local.read().await {
            Ok(Some(contents)) => contents,
            Ok(None) => return empty_collection(),
            Err(error) => {
                log::warn!("Storage read failed, treating as no data: {error}");
                return empty_collection();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(collection) => collection,
            Err(error) => {
                log::warn!("Stored data is malformed, treating as no data: {error}");
                empty_collection()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use geojson::{Feature, Geometry};

    use super::remote::UnimplementedRemote;
    use super::slot::MemorySlotStore;
    use super::*;

    fn properties(pairs: serde_json::Value) -> Option<geojson::JsonObject> {
        match pairs {
            serde_json::Value::Object(map) => Some(map),
            _ => unreachable!("test properties must be an object"),
        }
    }

    fn point_feature(name: &str, state: &str, lng: f64, lat: f64) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::Point(vec![lng, lat]))),
            id: None,
            properties: properties(serde_json::json!({ "name": name, "state": state })),
            foreign_members: None,
        }
    }

    fn polygon_feature(name: &str, state: &str, west: f64, south: f64, east: f64, north: f64) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::Polygon(vec![vec![
                vec![west, south],
                vec![east, south],
                vec![east, north],
                vec![west, north],
                vec![west, south],
            ]]))),
            id: None,
            properties: properties(serde_json::json!({ "name": name, "state": state })),
            foreign_members: None,
        }
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    fn names(collection: &FeatureCollection) -> Vec<&str> {
        collection
            .features
            .iter()
            .filter_map(|f| f.properties.as_ref())
            .filter_map(|p| p.get("name"))
            .filter_map(serde_json::Value::as_str)
            .collect()
    }

    fn local_service() -> DataService {
        DataService::new(Arc::new(MemorySlotStore::new()), Arc::new(UnimplementedRemote))
    }

    /// Remote fake that accepts bulk writes. Used to test the migration
    /// gate.
    #[derive(Default)]
    struct AcceptingRemote {
        stored: Mutex<Option<FeatureCollection>>,
    }

    #[async_trait]
    impl RemoteStore for AcceptingRemote {
        async fn fetch(&self, _filters: &Filters) -> Result<FeatureCollection, RemoteError> {
            Ok(self
                .stored
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
                .unwrap_or_else(empty_collection))
        }

        async fn bulk_write(&self, collection: &FeatureCollection) -> Result<(), RemoteError> {
            *self
                .stored
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(collection.clone());
            Ok(())
        }

        async fn query_radius(
            &self,
            _lat: f64,
            _lng: f64,
            _radius_km: f64,
        ) -> Result<FeatureCollection, RemoteError> {
            Err(RemoteError::Unimplemented {
                operation: "query_radius",
            })
        }
    }

    #[tokio::test]
    async fn save_appends_in_order() {
        let service = local_service();

        service
            .save_data(&collection(vec![
                point_feature("Pichavaram", "Tamil Nadu", 79.77, 11.43),
                point_feature("Muthupet", "Tamil Nadu", 79.52, 10.4),
            ]))
            .await
            .unwrap();
        service
            .save_data(&collection(vec![point_feature(
                "Bhitarkanika",
                "Odisha",
                86.9,
                20.7,
            )]))
            .await
            .unwrap();

        let stored = service.get_data(&Filters::default()).await;
        assert_eq!(names(&stored), vec!["Pichavaram", "Muthupet", "Bhitarkanika"]);
    }

    #[tokio::test]
    async fn duplicate_saves_are_not_deduplicated() {
        let service = local_service();
        let batch = collection(vec![point_feature("Pichavaram", "Tamil Nadu", 79.77, 11.43)]);

        service.save_data(&batch).await.unwrap();
        service.save_data(&batch).await.unwrap();

        let stored = service.get_data(&Filters::default()).await;
        assert_eq!(names(&stored), vec!["Pichavaram", "Pichavaram"]);
    }

    #[tokio::test]
    async fn state_filter_is_case_insensitive_substring() {
        let service = local_service();
        service
            .save_data(&collection(vec![
                point_feature("Pichavaram", "Tamil Nadu", 79.77, 11.43),
                point_feature("Bhitarkanika", "Odisha", 86.9, 20.7),
                point_feature("Coringa", "Andhra Pradesh", 82.23, 16.75),
            ]))
            .await
            .unwrap();

        let filtered = service
            .get_data(&Filters {
                state: Some("tamil".to_string()),
            })
            .await;
        assert_eq!(names(&filtered), vec!["Pichavaram"]);

        let filtered = service
            .get_data(&Filters {
                state: Some("pradesh".to_string()),
            })
            .await;
        assert_eq!(names(&filtered), vec!["Coringa"]);
    }

    #[tokio::test]
    async fn empty_store_stats() {
        let service = local_service();
        let stats = service.get_stats().await;
        assert_eq!(
            stats,
            DataStats {
                total_features: 0,
                states: Vec::new(),
                storage_mode: StorageMode::LocalStorage,
            }
        );
        assert_eq!(stats.storage_mode.to_string(), "Local Storage");
    }

    #[tokio::test]
    async fn stats_deduplicate_states_in_first_seen_order() {
        let service = local_service();
        service
            .save_data(&collection(vec![
                point_feature("Pichavaram", "Tamil Nadu", 79.77, 11.43),
                point_feature("Bhitarkanika", "Odisha", 86.9, 20.7),
                point_feature("Muthupet", "Tamil Nadu", 79.52, 10.4),
            ]))
            .await
            .unwrap();

        let stats = service.get_stats().await;
        assert_eq!(stats.total_features, 3);
        assert_eq!(stats.states, vec!["Tamil Nadu", "Odisha"]);
    }

    #[tokio::test]
    async fn clear_empties_data_and_stats() {
        let service = local_service();
        service
            .save_data(&collection(vec![point_feature(
                "Pichavaram",
                "Tamil Nadu",
                79.77,
                11.43,
            )]))
            .await
            .unwrap();

        service.clear().await.unwrap();

        assert!(service.get_data(&Filters::default()).await.features.is_empty());
        let stats = service.get_stats().await;
        assert_eq!(stats.total_features, 0);
        assert!(stats.states.is_empty());
    }

    #[tokio::test]
    async fn corrupt_slot_reads_as_empty() {
        let slot = Arc::new(MemorySlotStore::new());
        slot.write("{not valid json").await.unwrap();
        let service = DataService::new(slot, Arc::new(UnimplementedRemote));

        assert!(service.get_data(&Filters::default()).await.features.is_empty());
        assert_eq!(service.get_stats().await.total_features, 0);
    }

    #[tokio::test]
    async fn radius_query_keeps_near_points_and_reachable_polygons() {
        let service = local_service();
        service
            .save_data(&collection(vec![
                point_feature("Pichavaram", "Tamil Nadu", 79.77, 11.43),
                point_feature("Everglades", "Florida", -80.9, 25.4),
                polygon_feature("Bhitarkanika", "Odisha", 86.7, 20.5, 87.1, 20.9),
            ]))
            .await
            .unwrap();

        // Near Pichavaram: the far point drops, the distant polygon drops.
        let near = service.get_by_location(11.4, 79.8, 25.0).await;
        assert_eq!(names(&near), vec!["Pichavaram"]);

        // Inside the Bhitarkanika polygon: containment counts as distance
        // zero even with a tiny radius.
        let inside = service.get_by_location(20.7, 86.9, 0.5).await;
        assert_eq!(names(&inside), vec!["Bhitarkanika"]);
    }

    #[tokio::test]
    async fn quota_rejection_surfaces_as_store_error() {
        let service = DataService::new(
            Arc::new(MemorySlotStore::with_capacity(16)),
            Arc::new(UnimplementedRemote),
        );

        let error = service
            .save_data(&collection(vec![point_feature(
                "Pichavaram",
                "Tamil Nadu",
                79.77,
                11.43,
            )]))
            .await
            .unwrap_err();
        assert!(matches!(error, PersistenceError::Store(_)));
    }

    #[tokio::test]
    async fn migration_against_stub_stays_local() {
        let mut service = local_service();
        service
            .save_data(&collection(vec![point_feature(
                "Pichavaram",
                "Tamil Nadu",
                79.77,
                11.43,
            )]))
            .await
            .unwrap();

        let outcome = service.migrate().await.unwrap();
        assert!(matches!(outcome, MigrationOutcome::RemoteRejected { .. }));
        assert_eq!(service.mode(), StorageMode::LocalStorage);
        // Local data untouched.
        assert_eq!(service.get_stats().await.total_features, 1);
    }

    #[tokio::test]
    async fn migration_flips_mode_only_on_remote_success() {
        let slot = Arc::new(MemorySlotStore::new());
        let remote = Arc::new(AcceptingRemote::default());
        let mut service = DataService::new(slot, Arc::clone(&remote) as Arc<dyn RemoteStore>);

        service
            .save_data(&collection(vec![
                point_feature("Pichavaram", "Tamil Nadu", 79.77, 11.43),
                point_feature("Bhitarkanika", "Odisha", 86.9, 20.7),
            ]))
            .await
            .unwrap();

        let outcome = service.migrate().await.unwrap();
        assert_eq!(outcome, MigrationOutcome::Migrated { features_moved: 2 });
        assert_eq!(service.mode(), StorageMode::Firebase);
        assert_eq!(service.get_stats().await.storage_mode, StorageMode::Firebase);

        // Reads now come from the remote store.
        let remote_data = service.get_data(&Filters::default()).await;
        assert_eq!(remote_data.features.len(), 2);

        // A second migrate is a no-op.
        assert_eq!(service.migrate().await.unwrap(), MigrationOutcome::AlreadyRemote);
    }
}
