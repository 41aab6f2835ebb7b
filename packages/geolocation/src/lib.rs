#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! One-shot position resolution with pending/available/failed state.
//!
//! Wraps whatever positioning capability the host environment provides
//! behind the [`PositionSource`] trait. Resolution is a single attempt
//! bounded by a timeout; there is no automatic retry. A recent fix is
//! served from cache without consulting the source again.
//!
//! Consumers must treat the three [`LocationState`] values as distinct:
//! "no coordinates yet" is not the same as "permanently failed".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mangrove_map_report_models::Coordinates;
use tokio::time::Instant;

/// Options for a position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Request the most accurate fix the source can produce.
    pub high_accuracy: bool,
    /// Upper bound on how long one resolution attempt may take.
    pub timeout: Duration,
    /// Maximum age of a cached fix that may be served without a new
    /// resolution attempt.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }
}

/// Errors a position source can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    /// The host environment has no positioning capability.
    #[error("Geolocation is not supported by this environment")]
    Unsupported,

    /// The user denied the location request.
    #[error("Location access denied: {0}")]
    Denied(String),

    /// The source failed to produce a fix.
    #[error("Position unavailable: {0}")]
    Unavailable(String),

    /// The resolution attempt exceeded the configured timeout.
    #[error("Timed out waiting for a position fix")]
    Timeout,
}

/// Resolution state as observed by consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationState {
    /// No resolution attempt has completed yet.
    Pending,
    /// A fix is available.
    Available(Coordinates),
    /// The attempt failed; the string is a human-readable reason.
    /// Dependent features stay disabled until the user retries.
    Failed(String),
}

impl LocationState {
    /// The coordinates, when available.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Available(coords) => Some(*coords),
            Self::Pending | Self::Failed(_) => None,
        }
    }
}

/// A one-shot positioning capability.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Resolves the caller's current position once.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError`] when no fix can be produced.
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError>;
}

/// A fix that always resolves to the same coordinates. Test and demo
/// fixture.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionSource(pub Coordinates);

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// A source that always fails with the given error. Test fixture.
#[derive(Debug, Clone)]
pub struct FailingPositionSource(pub GeolocationError);

#[async_trait]
impl PositionSource for FailingPositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError> {
        Err(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedFix {
    coordinates: Coordinates,
    resolved_at: Instant,
}

/// Resolves and caches the caller's position.
///
/// One outstanding request at a time, no cancellation: dropping the
/// future before completion simply leaves the result unobserved.
pub struct Geolocator {
    source: Arc<dyn PositionSource>,
    options: PositionOptions,
    cache: Option<CachedFix>,
    state: LocationState,
}

impl Geolocator {
    /// Creates a locator over the given source with default options.
    #[must_use]
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self::with_options(source, PositionOptions::default())
    }

    /// Creates a locator with explicit options.
    #[must_use]
    pub const fn with_options(source: Arc<dyn PositionSource>, options: PositionOptions) -> Self {
        Self {
            source,
            options,
            cache: None,
            state: LocationState::Pending,
        }
    }

    /// The most recently observed state. [`LocationState::Pending`] until
    /// the first call to [`Self::locate`] completes.
    #[must_use]
    pub const fn state(&self) -> &LocationState {
        &self.state
    }

    /// Resolves the current position.
    ///
    /// Serves a cached fix younger than `maximum_age` without touching the
    /// source. Otherwise makes exactly one attempt, bounded by the
    /// configured timeout. Failures are terminal for this call; the caller
    /// decides whether to invoke again.
    pub async fn locate(&mut self) -> LocationState {
        if let Some(cached) = self.cache {
            if cached.resolved_at.elapsed() <= self.options.maximum_age {
                log::debug!("Serving cached position fix");
                self.state = LocationState::Available(cached.coordinates);
                return self.state.clone();
            }
        }

        let attempt = self.source.current_position(&self.options);
        self.state = match tokio::time::timeout(self.options.timeout, attempt).await {
            Ok(Ok(coordinates)) => {
                self.cache = Some(CachedFix {
                    coordinates,
                    resolved_at: Instant::now(),
                });
                LocationState::Available(coordinates)
            }
            Ok(Err(error)) => {
                log::warn!("Position resolution failed: {error}");
                LocationState::Failed(error.to_string())
            }
            Err(_) => {
                log::warn!("Position resolution timed out");
                LocationState::Failed(GeolocationError::Timeout.to_string())
            }
        };
        self.state.clone()
    }
}
