//! Bounding boxes for requests: explicit, whole domain, or geocoded from a place name.

use std::fmt;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::countries::is_country;
use crate::error::{Error, Result};

/// Sentinel meaning "no area restriction".
pub const ENTIRE_REGION: &str = "Entire available region";

pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// `[north, west, south, east]` in degrees, the order the archive expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl From<[f64; 4]> for BoundingBox {
    fn from([north, west, south, east]: [f64; 4]) -> Self {
        Self {
            north,
            west,
            south,
            east,
        }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.north, b.west, b.south, b.east]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.north, self.west, self.south, self.east)
    }
}

/// Requested area as given by the caller.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Option<RawArea>")]
pub enum Area {
    #[default]
    Entire,
    Bounds(BoundingBox),
    Place(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArea {
    Bounds([f64; 4]),
    Name(String),
}

impl From<Option<RawArea>> for Area {
    fn from(raw: Option<RawArea>) -> Self {
        match raw {
            None => Area::Entire,
            Some(RawArea::Bounds(b)) => Area::Bounds(b.into()),
            Some(RawArea::Name(name)) => Area::from(name.as_str()),
        }
    }
}

impl From<&str> for Area {
    fn from(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(ENTIRE_REGION) {
            Area::Entire
        } else {
            Area::Place(name.to_string())
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Area::Entire => f.write_str(ENTIRE_REGION),
            Area::Bounds(b) => write!(f, "{b}"),
            Area::Place(p) => f.write_str(p),
        }
    }
}

/// Nominatim query keyword used for a place name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceKind {
    Country,
    State,
    City,
}

impl PlaceKind {
    pub fn for_place(place: &str, state_override: bool) -> Self {
        if is_country(place) {
            PlaceKind::Country
        } else if state_override {
            PlaceKind::State
        } else {
            PlaceKind::City
        }
    }

    pub fn query_key(self) -> &'static str {
        match self {
            PlaceKind::Country => "country",
            PlaceKind::State => "state",
            PlaceKind::City => "city",
        }
    }
}

/// A place-name lookup service returning its raw JSON search response.
pub trait Geocoder {
    fn search(&self, kind: PlaceKind, place: &str) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct NominatimOptions {
    pub search_url: String,
    pub user_agent: String,
}

impl Default for NominatimOptions {
    fn default() -> Self {
        Self {
            search_url: NOMINATIM_SEARCH_URL.to_string(),
            user_agent: concat!("era5-download-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// OpenStreetMap Nominatim search client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    search_url: Url,
    http: HttpClient,
}

impl NominatimClient {
    pub fn new(opts: NominatimOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&opts.user_agent)
                .map_err(|_| Error::Configuration(format!("invalid user agent {:?}", opts.user_agent)))?,
        );
        let http = HttpClient::builder().default_headers(headers).build()?;
        Ok(Self {
            search_url: Url::parse(&opts.search_url)?,
            http,
        })
    }

    pub fn search_url(&self, kind: PlaceKind, place: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair(kind.query_key(), place)
            .append_pair("format", "json")
            .append_pair("polygon", "0");
        url
    }
}

impl Geocoder for NominatimClient {
    fn search(&self, kind: PlaceKind, place: &str) -> Result<Value> {
        let url = self.search_url(kind, place);
        debug!(%url, "geocoding lookup");
        self.http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<Value>())
            .map_err(|e| Error::ExternalService(format!("geocoding lookup for {place:?} failed: {e}")))
    }
}

/// Resolve `area` to a bounding box, or `None` for the whole available domain.
pub fn resolve_area(
    area: &Area,
    state_override: bool,
    geocoder: &dyn Geocoder,
) -> Result<Option<BoundingBox>> {
    let bbox = match area {
        Area::Entire => None,
        Area::Bounds(b) => Some(*b),
        Area::Place(place) => Some(place_bounding_box(place, state_override, geocoder)?),
    };
    if let Some(b) = &bbox {
        info!(bbox = %b, "bounding box");
    }
    Ok(bbox)
}

pub fn place_bounding_box(
    place: &str,
    state_override: bool,
    geocoder: &dyn Geocoder,
) -> Result<BoundingBox> {
    let kind = PlaceKind::for_place(place, state_override);
    let response = geocoder.search(kind, place)?;
    bounding_box_from_response(place, &response)
}

/// Read the first hit's `boundingbox` (`[south, north, west, east]` strings).
pub fn bounding_box_from_response(place: &str, response: &Value) -> Result<BoundingBox> {
    let first = response
        .as_array()
        .and_then(|hits| hits.first())
        .ok_or_else(|| Error::Resolution(format!("no geocoding results for {place:?}")))?;

    let raw = first
        .get("boundingbox")
        .and_then(|b| b.as_array())
        .filter(|b| b.len() == 4)
        .ok_or_else(|| Error::Resolution(format!("no usable boundingbox for {place:?}")))?;

    let mut coords = [0f64; 4];
    for (slot, v) in coords.iter_mut().zip(raw) {
        *slot = match v {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
        .ok_or_else(|| Error::Resolution(format!("non-numeric boundingbox value {v} for {place:?}")))?;
    }

    let [south, north, west, east] = coords;
    Ok(BoundingBox {
        north,
        west,
        south,
        east,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    struct FakeGeocoder {
        response: Value,
        calls: RefCell<Vec<(PlaceKind, String)>>,
    }

    impl FakeGeocoder {
        fn new(response: Value) -> Self {
            Self {
                response,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Geocoder for FakeGeocoder {
        fn search(&self, kind: PlaceKind, place: &str) -> Result<Value> {
            self.calls.borrow_mut().push((kind, place.to_string()));
            Ok(self.response.clone())
        }
    }

    fn germany() -> Value {
        json!([{ "display_name": "Deutschland", "boundingbox": ["47.2701114", "55.099161", "5.8663153", "15.0419319"] }])
    }

    #[test]
    fn explicit_box_is_returned_unchanged() {
        let b = BoundingBox::from([60.0, -10.0, 50.0, 2.0]);
        let geo = FakeGeocoder::new(json!([]));
        assert_eq!(resolve_area(&Area::Bounds(b), false, &geo).unwrap(), Some(b));
        assert!(geo.calls.borrow().is_empty());
    }

    #[test]
    fn entire_region_resolves_to_none() {
        let geo = FakeGeocoder::new(json!([]));
        assert_eq!(resolve_area(&Area::from(ENTIRE_REGION), false, &geo).unwrap(), None);
        assert_eq!(resolve_area(&Area::from(""), false, &geo).unwrap(), None);
    }

    #[test]
    fn place_is_reordered_north_west_south_east() {
        let geo = FakeGeocoder::new(germany());
        let b = resolve_area(&Area::from("Germany"), false, &geo).unwrap().unwrap();
        assert_eq!(<[f64; 4]>::from(b), [55.099161, 5.8663153, 47.2701114, 15.0419319]);
        assert_eq!(geo.calls.borrow()[0], (PlaceKind::Country, "Germany".to_string()));
    }

    #[test]
    fn non_country_uses_city_or_state() {
        assert_eq!(PlaceKind::for_place("Atlanta", false), PlaceKind::City);
        assert_eq!(PlaceKind::for_place("Georgia", true), PlaceKind::Country);
        assert_eq!(PlaceKind::for_place("Bavaria", true), PlaceKind::State);
    }

    #[test]
    fn empty_or_malformed_results_are_resolution_errors() {
        let geo = FakeGeocoder::new(json!([]));
        assert!(matches!(
            place_bounding_box("Nowhere", false, &geo),
            Err(Error::Resolution(_))
        ));
        let geo = FakeGeocoder::new(json!([{ "boundingbox": ["1", "2"] }]));
        assert!(matches!(place_bounding_box("Half", false, &geo), Err(Error::Resolution(_))));
        let geo = FakeGeocoder::new(json!([{ "boundingbox": ["a", "2", "3", "4"] }]));
        assert!(matches!(place_bounding_box("Bad", false, &geo), Err(Error::Resolution(_))));
    }

    #[test]
    fn search_url_carries_fixed_parameters() {
        let client = NominatimClient::new(NominatimOptions::default()).unwrap();
        let url = client.search_url(PlaceKind::City, "buenos aires");
        assert_eq!(
            url.as_str(),
            "https://nominatim.openstreetmap.org/search?city=buenos+aires&format=json&polygon=0"
        );
    }

    #[test]
    fn area_deserializes_from_name_box_or_null() {
        let a: Area = serde_json::from_str("\"Germany\"").unwrap();
        assert_eq!(a, Area::Place("Germany".into()));
        let a: Area = serde_json::from_str("[60, -10, 50, 2.5]").unwrap();
        assert_eq!(a, Area::Bounds(BoundingBox::from([60.0, -10.0, 50.0, 2.5])));
        let a: Area = serde_json::from_str("null").unwrap();
        assert_eq!(a, Area::Entire);
        let a: Area = serde_json::from_str("\"Entire available region\"").unwrap();
        assert_eq!(a, Area::Entire);
    }

    #[test]
    fn bounding_box_serializes_as_list() {
        let b = BoundingBox::from([60.0, -10.0, 50.0, 2.5]);
        assert_eq!(serde_json::to_value(b).unwrap(), json!([60.0, -10.0, 50.0, 2.5]));
    }
}
