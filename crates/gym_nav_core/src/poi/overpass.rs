//! Gym discovery through the Overpass API.
//!
//! The query selects nodes, ways and relations tagged as fitness facilities
//! and asks for `out center;` so area geometries come back with a centroid.
//! Responses are walked field by field: an element contributes a POI only if
//! it has an integer `id` and a resolvable coordinate.

use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::PoiConfig;
use crate::error::{NavError, Result};
use crate::model::{LatLng, PointOfInterest};
use crate::poi::PoiFinder;

/// Overpass tag filters that identify a gym.
pub const GYM_TAGS: &[(&str, &str)] = &[("leisure", "fitness_centre"), ("amenity", "gym")];

const ELEMENT_KINDS: &[&str] = &["node", "way", "relation"];

pub struct OverpassClient {
    client: Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(config: &PoiConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.connect_timeout() + config.read_timeout());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| NavError::Config(format!("Unable to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PoiFinder for OverpassClient {
    fn find_pois(&self, center: LatLng, radius_meters: u32) -> Result<Vec<PointOfInterest>> {
        let query = build_query(center, radius_meters);
        debug!(%center, radius_meters, "Querying Overpass");

        // `form` sets Content-Type: application/x-www-form-urlencoded
        let resp = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Overpass rejected the query");
            return Err(NavError::RemoteRejected {
                status: status.as_u16(),
            });
        }

        let body = resp.text()?;
        let pois = parse_elements(&body)?;
        info!(count = pois.len(), %center, radius_meters, "Gyms found");
        Ok(pois)
    }
}

pub fn build_query(center: LatLng, radius_meters: u32) -> String {
    let around = format!(
        "(around:{radius_meters},{:.7},{:.7})",
        center.latitude, center.longitude
    );

    let mut q = String::from("[out:json][timeout:25];\n(\n");
    for (key, value) in GYM_TAGS {
        for kind in ELEMENT_KINDS {
            q.push_str(&format!("  {kind}[\"{key}\"=\"{value}\"]{around};\n"));
        }
    }
    q.push_str(");\nout center;");
    q
}

pub fn parse_elements(body: &str) -> Result<Vec<PointOfInterest>> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| NavError::MalformedResponse(format!("POI response is not JSON: {e}")))?;

    let Some(obj) = root.as_object() else {
        return Err(NavError::MalformedResponse(
            "POI response is not a JSON object".to_string(),
        ));
    };

    // Overpass reports query timeouts as a 200 with a `remark`
    if let Some(remark) = obj.get("remark").and_then(Value::as_str)
        && remark.contains("runtime error")
    {
        return Err(NavError::NetworkTransient(remark.to_string()));
    }

    let elements = match obj.get("elements") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(NavError::MalformedResponse(
                "`elements` is not an array".to_string(),
            ));
        }
    };

    let mut seen = HashSet::with_capacity(elements.len());
    let mut out = Vec::with_capacity(elements.len());

    for element in elements {
        match parse_element(element) {
            Some(poi) => {
                if seen.insert(poi.id) {
                    out.push(poi);
                }
            }
            None => debug!(%element, "Skipping element without id or coordinates"),
        }
    }

    Ok(out)
}

fn parse_element(element: &Value) -> Option<PointOfInterest> {
    let id = element.get("id")?.as_i64()?;

    // direct coordinates first, then the centroid of a way/relation
    let position = coordinates(element).or_else(|| element.get("center").and_then(coordinates))?;

    let name = element
        .get("tags")
        .and_then(|tags| string_tag(tags, "name").or_else(|| string_tag(tags, "brand")));

    Some(PointOfInterest {
        id,
        name,
        latitude: position.latitude,
        longitude: position.longitude,
    })
}

fn coordinates(v: &Value) -> Option<LatLng> {
    let lat = v.get("lat")?.as_f64()?;
    let lon = v.get("lon")?.as_f64()?;
    let p = LatLng::new(lat, lon);
    p.is_valid().then_some(p)
}

fn string_tag(tags: &Value, key: &str) -> Option<String> {
    tags.get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_covers_all_kinds_and_requests_centers() {
        let q = build_query(LatLng::new(45.07, 7.68), 2000);
        assert!(q.starts_with("[out:json]"));
        assert!(q.contains(r#"way["leisure"="fitness_centre"](around:2000,45.0700000,7.6800000);"#));
        assert!(q.contains(r#"node["amenity"="gym"]"#));
        assert!(q.contains(r#"relation["amenity"="gym"]"#));
        assert!(q.ends_with("out center;"));
    }

    #[test]
    fn center_is_used_when_direct_coordinates_are_missing() {
        let body = r#"{"elements":[{"type":"way","id":5,"center":{"lat":10,"lon":20},"tags":{"name":"Iron Temple"}}]}"#;
        let pois = parse_elements(body).unwrap();
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].position(), LatLng::new(10.0, 20.0));
        assert_eq!(pois[0].name.as_deref(), Some("Iron Temple"));
    }

    #[test]
    fn direct_coordinates_win_over_center() {
        let body = r#"{"elements":[{"id":1,"lat":1.5,"lon":2.5,"center":{"lat":9,"lon":9}}]}"#;
        let pois = parse_elements(body).unwrap();
        assert_eq!(pois[0].position(), LatLng::new(1.5, 2.5));
    }

    #[test]
    fn geometry_less_and_malformed_elements_are_skipped() {
        let body = r#"{"elements":[
            {"id":1,"tags":{"name":"Nowhere"}},
            {"id":"two","lat":1,"lon":1},
            {"id":3,"lat":"x","lon":1},
            {"id":4,"lat":1,"center":{"lat":2}},
            42,
            {"id":5,"lat":3,"lon":4}
        ]}"#;
        let pois = parse_elements(body).unwrap();
        assert_eq!(pois.iter().map(|p| p.id).collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn name_falls_back_to_brand_then_none() {
        let body = r#"{"elements":[
            {"id":1,"lat":0,"lon":0,"tags":{"brand":"McFit"}},
            {"id":2,"lat":0,"lon":0,"tags":{"name":"  ","brand":"Anytime"}},
            {"id":3,"lat":0,"lon":0,"tags":{"leisure":"fitness_centre"}},
            {"id":4,"lat":0,"lon":0}
        ]}"#;
        let names: Vec<_> = parse_elements(body)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(
            names,
            vec![
                Some("McFit".to_string()),
                Some("Anytime".to_string()),
                None,
                None
            ]
        );
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let body = r#"{"elements":[{"id":1,"lat":1,"lon":1},{"id":1,"lat":2,"lon":2}]}"#;
        let pois = parse_elements(body).unwrap();
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].latitude, 1.0);
    }

    #[test]
    fn missing_elements_is_empty_but_wrong_shape_is_malformed() {
        assert!(parse_elements(r#"{"version":0.6}"#).unwrap().is_empty());
        assert!(matches!(
            parse_elements(r#"{"elements":{}}"#),
            Err(NavError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_elements("[]"),
            Err(NavError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_elements("<html>"),
            Err(NavError::MalformedResponse(_))
        ));
    }

    #[test]
    fn runtime_error_remark_is_transient() {
        let body = r#"{"elements":[],"remark":"runtime error: Query timed out in \"query\" at line 3 after 25 seconds."}"#;
        assert!(matches!(
            parse_elements(body),
            Err(NavError::NetworkTransient(_))
        ));
    }
}
