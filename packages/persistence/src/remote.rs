//! Remote ("Firebase") backend placeholder.
//!
//! The interface covers the three operations a future remote backend
//! must provide: fetch with filters, bulk write of the whole collection,
//! and a location-radius query. There is no implemented transport; the
//! shipped [`UnimplementedRemote`] resolves every call with a structured
//! non-success instead of panicking, and the service keeps its mode flag
//! on local storage until a remote write actually succeeds.

use async_trait::async_trait;
use geojson::FeatureCollection;

use crate::Filters;

/// Errors from the remote backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The operation has no implemented transport yet.
    #[error("remote backend not implemented: {operation}")]
    Unimplemented {
        /// Name of the attempted operation.
        operation: &'static str,
    },

    /// The backend rejected the request.
    #[error("remote backend rejected the request: {message}")]
    Rejected {
        /// Backend-provided detail.
        message: String,
    },
}

/// A remote bulk store for the reference collection.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the remote collection, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the backend cannot serve the query.
    async fn fetch(&self, filters: &Filters) -> Result<FeatureCollection, RemoteError>;

    /// Writes the whole collection to the remote backend.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the backend rejects the write.
    async fn bulk_write(&self, collection: &FeatureCollection) -> Result<(), RemoteError>;

    /// Queries features within `radius_km` of `(lat, lng)`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the backend cannot serve the query.
    async fn query_radius(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
    ) -> Result<FeatureCollection, RemoteError>;
}

/// The placeholder remote backend: every call resolves with a structured
/// non-success.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedRemote;

#[async_trait]
impl RemoteStore for UnimplementedRemote {
    async fn fetch(&self, _filters: &Filters) -> Result<FeatureCollection, RemoteError> {
        log::warn!("Remote fetch not implemented yet");
        Err(RemoteError::Unimplemented { operation: "fetch" })
    }

    async fn bulk_write(&self, _collection: &FeatureCollection) -> Result<(), RemoteError> {
        log::warn!("Remote bulk write not implemented yet");
        Err(RemoteError::Unimplemented {
            operation: "bulk_write",
        })
    }

    async fn query_radius(
        &self,
        _lat: f64,
        _lng: f64,
        _radius_km: f64,
    ) -> Result<FeatureCollection, RemoteError> {
        log::warn!("Remote location query not implemented yet");
        Err(RemoteError::Unimplemented {
            operation: "query_radius",
        })
    }
}
