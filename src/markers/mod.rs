//! Map marker records and their synthesis from grounding links.
//!
//! Each turn's grounding links become markers appended to the session's
//! marker set. Markers accumulate for the whole session: the synthesizer
//! never removes or reorders prior markers, and appended markers are only
//! mutated by explicit style edits.

pub mod placeholder;

pub use placeholder::{PlaceDataProvider, PlaceDetails, SyntheticPlaceData};

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MarkerConfig;
use crate::grounding::GroundingLink;
use crate::route::RouteSummary;
use crate::state::LatLng;

/// Default pin color for plain place markers.
const PLACE_COLOR: &str = "#e2574c";
/// Pin color for markers that are numbered route stops.
const STOP_COLOR: &str = "#4a7dd6";

/// A marker on the map.
///
/// Position and all place details are synthesized (see
/// [`placeholder`]) — they are presentation placeholders, not facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    /// Session-unique id (`marker-<timestamp>-<index>`).
    pub id: String,
    /// Marker position (jittered around the viewport center).
    pub position: LatLng,
    /// Place title from the grounding link.
    pub title: String,
    /// Source URI from the grounding link.
    pub uri: String,
    /// Synthetic star rating.
    pub rating: f32,
    /// Synthetic review count.
    pub review_count: u32,
    /// Placeholder photo URL.
    pub photo_url: String,
    /// Synthetic opening hours.
    pub hours: String,
    /// Synthetic address.
    pub address: String,
    /// Synthetic phone number.
    pub phone: String,
    /// Synthetic website.
    pub website: String,
    /// Pin color (user style edits may change it).
    pub color: String,
    /// Icon name (user style edits may change it).
    pub icon: String,
    /// 1-based position of this marker's title in the active route's
    /// stops, when it is a route stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_number: Option<u32>,
}

impl MapMarker {
    #[cfg(test)]
    pub(crate) fn for_test(id: &str, title: &str) -> Self {
        Self {
            id: id.to_owned(),
            position: LatLng::default(),
            title: title.to_owned(),
            uri: format!("https://maps.example/{title}"),
            rating: 4.0,
            review_count: 100,
            photo_url: String::new(),
            hours: String::new(),
            address: String::new(),
            phone: String::new(),
            website: String::new(),
            color: PLACE_COLOR.to_owned(),
            icon: "place".to_owned(),
            stop_number: None,
        }
    }
}

/// Builds marker records for one turn's grounding links.
pub struct MarkerSynthesizer {
    jitter_km: f64,
    provider: Arc<dyn PlaceDataProvider>,
}

impl MarkerSynthesizer {
    /// Create a synthesizer with the synthetic placeholder provider.
    pub fn new(config: &MarkerConfig) -> Self {
        Self::with_provider(config, Arc::new(SyntheticPlaceData))
    }

    /// Create a synthesizer with a custom place-data provider.
    pub fn with_provider(config: &MarkerConfig, provider: Arc<dyn PlaceDataProvider>) -> Self {
        Self {
            jitter_km: config.jitter_km,
            provider,
        }
    }

    /// Build markers for the turn's links, in link order.
    ///
    /// Marker ids are derived from the turn timestamp plus the link index.
    /// Positions are jittered uniformly around `center` within the
    /// configured radius since no geocoding is performed. `stop_number`
    /// joins each link to the route's stops by first title match — with
    /// duplicate titles the first stop wins, a known limitation of using
    /// titles as join keys.
    pub fn synthesize(
        &self,
        links: &[GroundingLink],
        route: Option<&RouteSummary>,
        center: LatLng,
    ) -> Vec<MapMarker> {
        let turn_stamp = chrono::Utc::now().timestamp_millis();
        links
            .iter()
            .enumerate()
            .map(|(i, link)| self.marker_for_link(link, route, center, turn_stamp, i))
            .collect()
    }

    fn marker_for_link(
        &self,
        link: &GroundingLink,
        route: Option<&RouteSummary>,
        center: LatLng,
        turn_stamp: i64,
        index: usize,
    ) -> MapMarker {
        let details = self.provider.details(&link.title);
        let stop_number = route
            .and_then(|r| r.stops.iter().position(|s| *s == link.title))
            .map(|i| i as u32 + 1);
        let (color, icon) = if stop_number.is_some() {
            (STOP_COLOR, "route_stop")
        } else {
            (PLACE_COLOR, "place")
        };
        MapMarker {
            id: format!("marker-{turn_stamp}-{index}"),
            position: jitter_position(center, self.jitter_km),
            title: link.title.clone(),
            uri: link.uri.clone(),
            rating: details.rating,
            review_count: details.review_count,
            photo_url: details.photo_url,
            hours: details.hours,
            address: details.address,
            phone: details.phone,
            website: details.website,
            color: color.to_owned(),
            icon: icon.to_owned(),
            stop_number,
        }
    }
}

/// Place a point uniformly within `radius_km` of `center`.
fn jitter_position(center: LatLng, radius_km: f64) -> LatLng {
    const KM_PER_DEG_LAT: f64 = 110.574;
    const KM_PER_DEG_LNG_EQUATOR: f64 = 111.320;

    let mut rng = rand::thread_rng();
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    // sqrt for uniform density over the disk rather than clustering at the center
    let radius = radius_km * rng.gen_range(0.0_f64..1.0).sqrt();

    let lat = center.lat + (radius * angle.sin()) / KM_PER_DEG_LAT;
    let km_per_deg_lng = KM_PER_DEG_LNG_EQUATOR * center.lat.to_radians().cos().max(0.01);
    let lng = center.lng + (radius * angle.cos()) / km_per_deg_lng;
    LatLng { lat, lng }
}
