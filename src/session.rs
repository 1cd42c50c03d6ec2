//! Per-user interaction state: dataset readiness, the last lookup result,
//! the selection marker and the map view.
//!
//! Every entry point (map click, coordinate entry, place search) funnels into
//! the same locate-and-commit step. State is only committed once the whole
//! interaction succeeds, so a failed interaction leaves the previous view and
//! result in place. A miss clears the result and the marker.

use std::path::{Path, PathBuf};

use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::{
    error::{DataError, ExportError, GeocodeError, SessionError},
    geography::{
        locate::{self, LocateOutcome, LookupResult},
        zone_table::{Color, ZoneTable},
        GeoPoint, ZoneRegion, ZoneRegistry,
    },
    net::Geocoder,
    report::{self, ReportFormat},
};

/// Zoom used after a search or coordinate entry moves the view.
pub const SEARCH_ZOOM: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        MapView {
            center: GeoPoint {
                latitude: 22.5,
                longitude: 79.0,
            },
            zoom: 5,
        }
    }
}

/// Selection marker shown at a located point.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub point: GeoPoint,
    pub color: Color,
    pub popup: Vec<String>,
}

impl Marker {
    fn new(result: &LookupResult, color: Color) -> Self {
        let popup = vec![
            format!("Wind Zone: {}", result.zone_id),
            format!("Wind Speed: {} m/s", result.wind_speed_mps),
            format!("Standard: {}", result.standard_ref),
            format!("Latitude: {}", result.latitude_text()),
            format!("Longitude: {}", result.longitude_text()),
        ];
        Marker {
            point: result.point,
            color,
            popup,
        }
    }
}

enum Readiness {
    Loading(oneshot::Receiver<Result<ZoneRegistry, DataError>>),
    Ready(ZoneRegistry),
    Failed,
}

pub struct Session {
    readiness: Readiness,
    last_result: Option<LookupResult>,
    marker: Option<Marker>,
    view: MapView,
}

impl Session {
    pub fn with_registry(registry: ZoneRegistry) -> Self {
        Session::new(Readiness::Ready(registry))
    }

    /// Spawns the dataset load on the current tokio runtime. Interactions are
    /// rejected with [`SessionError::NotReady`] until it completes.
    pub fn begin_load(path: PathBuf, table: ZoneTable) -> Self {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            tracing::debug!("Loading zone dataset from {}", path.display());
            let result = ZoneRegistry::load_async(path, table).await;
            if let Err(e) = &result {
                tracing::error!("Zone dataset failed to load: {e}");
            }
            if tx.send(result).is_err() {
                tracing::debug!("Session dropped before the dataset finished loading");
            }
        });
        Session::awaiting(rx)
    }

    fn awaiting(rx: oneshot::Receiver<Result<ZoneRegistry, DataError>>) -> Self {
        Session::new(Readiness::Loading(rx))
    }

    fn new(readiness: Readiness) -> Self {
        Session {
            readiness,
            last_result: None,
            marker: None,
            view: MapView::default(),
        }
    }

    /// Moves a finished load into the ready or failed state. The load's
    /// `DataError` is returned exactly once, on the transition.
    fn poll(&mut self) -> Result<(), SessionError> {
        let Readiness::Loading(rx) = &mut self.readiness else {
            return Ok(());
        };
        match rx.try_recv() {
            Ok(Ok(registry)) => {
                self.readiness = Readiness::Ready(registry);
                Ok(())
            }
            Ok(Err(e)) => {
                self.readiness = Readiness::Failed;
                Err(e.into())
            }
            Err(TryRecvError::Empty) => Ok(()),
            Err(TryRecvError::Closed) => {
                self.readiness = Readiness::Failed;
                Err(DataError::LoadTask("load task ended without a result".to_owned()).into())
            }
        }
    }

    pub fn registry(&mut self) -> Result<&ZoneRegistry, SessionError> {
        self.poll()?;
        match &self.readiness {
            Readiness::Ready(registry) => Ok(registry),
            Readiness::Loading(_) => Err(SessionError::NotReady),
            Readiness::Failed => Err(SessionError::Failed),
        }
    }

    /// `Ok(false)` while the dataset is still loading.
    pub fn is_ready(&mut self) -> Result<bool, SessionError> {
        match self.registry() {
            Ok(_) => Ok(true),
            Err(SessionError::NotReady) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Suspends until the dataset load finishes.
    pub async fn wait_ready(&mut self) -> Result<&ZoneRegistry, SessionError> {
        if let Readiness::Loading(rx) = &mut self.readiness {
            // the receiver stays in place until a result arrives, so a
            // cancelled wait leaves the session loading
            let loaded = rx.await;
            match loaded {
                Ok(Ok(registry)) => self.readiness = Readiness::Ready(registry),
                Ok(Err(e)) => {
                    self.readiness = Readiness::Failed;
                    return Err(e.into());
                }
                Err(_) => {
                    self.readiness = Readiness::Failed;
                    return Err(DataError::LoadTask("load task ended without a result".to_owned()).into());
                }
            }
        }
        self.registry()
    }

    /// Map click at the given coordinates. The view does not move.
    pub fn click(&mut self, latitude: f64, longitude: f64) -> Result<LocateOutcome, SessionError> {
        self.registry()?;
        let point = GeoPoint::new(latitude, longitude)?;
        self.commit(point, false)
    }

    /// Typed `"lat,lon"` entry. Recenters the view on the point.
    pub fn enter_coordinates(&mut self, text: &str) -> Result<LocateOutcome, SessionError> {
        self.registry()?;
        let point = text.parse::<GeoPoint>()?;
        self.commit(point, true)
    }

    /// Free-text place search; only the geocoder's first candidate is used.
    pub async fn search<G: Geocoder>(
        &mut self,
        geocoder: &G,
        text: &str,
    ) -> Result<LocateOutcome, SessionError> {
        self.registry()?;
        let point = geocoder
            .geocode(text)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoResults(text.trim().to_owned()))?;
        self.commit(point, true)
    }

    fn commit(&mut self, point: GeoPoint, recenter: bool) -> Result<LocateOutcome, SessionError> {
        let registry = self.registry()?;
        let outcome = locate::locate(point, registry);
        let marker = match outcome.result() {
            Some(result) => Some(Marker::new(result, registry.color_for(&result.zone_id)?)),
            None => None,
        };

        if recenter {
            self.view = MapView {
                center: point,
                zoom: SEARCH_ZOOM,
            };
        }
        self.last_result = outcome.result().cloned();
        self.marker = marker;
        Ok(outcome)
    }

    /// Every region containing the point, without touching session state.
    pub fn regions_at(&mut self, point: GeoPoint) -> Result<Vec<&ZoneRegion>, SessionError> {
        let registry = self.registry()?;
        Ok(locate::locate_all(point, registry))
    }

    pub fn legend(&mut self) -> Result<String, SessionError> {
        Ok(self.registry()?.table().legend())
    }

    pub fn export(&self, format: ReportFormat) -> Result<String, ExportError> {
        report::render(self.last_result.as_ref(), format)
    }

    pub fn export_to(&self, format: ReportFormat, path: &Path) -> Result<String, ExportError> {
        report::export(self.last_result.as_ref(), format, path)
    }

    pub fn last_result(&self) -> Option<&LookupResult> {
        self.last_result.as_ref()
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn view(&self) -> MapView {
        self.view
    }
}
