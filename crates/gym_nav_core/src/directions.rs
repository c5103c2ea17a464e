//! Driving route lookup against a Directions-style JSON endpoint.
//!
//! Only the first route and its first leg are used. Zero routes is a valid
//! answer (`Ok(None)`); a response that cannot be understood is an error so
//! callers can tell "no route exists" from "could not determine".

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{API_KEY_ENV, DirectionsConfig};
use crate::error::{NavError, Result};
use crate::model::{LatLng, RouteResult};
use crate::polyline;

pub const TRAVEL_MODE: &str = "driving";

pub trait RoutePlanner: Send + Sync {
    fn plan_route(&self, origin: LatLng, destination: LatLng) -> Result<Option<RouteResult>>;
}

pub struct DirectionsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl DirectionsClient {
    pub fn new(config: &DirectionsConfig) -> Result<Self> {
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
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn plan_route_with_key(
        &self,
        api_key: &str,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<Option<RouteResult>> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(NavError::ConfigurationMissing(
                "directions API key is empty".to_string(),
            ));
        }

        debug!(%origin, %destination, "Requesting driving directions");

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origin", origin.to_string()),
                ("destination", destination.to_string()),
                ("mode", TRAVEL_MODE.to_string()),
                ("key", key.to_string()),
            ])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Directions request rejected");
            return Err(NavError::RemoteRejected {
                status: status.as_u16(),
            });
        }

        let body = resp.text()?;
        let route = parse_directions(&body)?;

        match &route {
            Some(r) => info!(
                points = r.path.len(),
                eta = %r.eta_text,
                distance = %r.distance_text,
                "Route planned"
            ),
            None => info!(%origin, %destination, "No driving route"),
        }
        Ok(route)
    }
}

impl RoutePlanner for DirectionsClient {
    fn plan_route(&self, origin: LatLng, destination: LatLng) -> Result<Option<RouteResult>> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            NavError::ConfigurationMissing(format!(
                "no directions API key (set {API_KEY_ENV} or directions.api_key)"
            ))
        })?;
        self.plan_route_with_key(key, origin, destination)
    }
}

pub fn parse_directions(body: &str) -> Result<Option<RouteResult>> {
    let root: Value = serde_json::from_str(body).map_err(|e| {
        NavError::MalformedResponse(format!("directions response is not JSON: {e}"))
    })?;

    if !root.is_object() {
        return Err(NavError::MalformedResponse(
            "directions response is not a JSON object".to_string(),
        ));
    }

    let message = root
        .get("error_message")
        .and_then(Value::as_str)
        .map(str::to_owned);

    match root.get("status").and_then(Value::as_str).unwrap_or("OK") {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => return Ok(None),
        "REQUEST_DENIED" => {
            return Err(NavError::ConfigurationMissing(format!(
                "directions API key rejected: {}",
                message.as_deref().unwrap_or("request denied")
            )));
        }
        "OVER_QUERY_LIMIT" | "UNKNOWN_ERROR" => {
            return Err(NavError::NetworkTransient(
                message.unwrap_or_else(|| "directions service busy".to_string()),
            ));
        }
        other => {
            return Err(NavError::ServiceError {
                status: other.to_string(),
                message,
            });
        }
    }

    let routes = match root.get("routes") {
        None | Some(Value::Null) => return Err(malformed("response has no `routes`")),
        Some(Value::Array(routes)) => routes,
        Some(_) => return Err(malformed("`routes` is not an array")),
    };

    // first route, first leg
    let Some(route) = routes.first() else {
        return Ok(None);
    };

    let leg = route
        .get("legs")
        .and_then(Value::as_array)
        .and_then(|legs| legs.first())
        .ok_or_else(|| malformed("route has no legs"))?;

    let eta_text = text_field(leg, "duration").ok_or_else(|| malformed("leg has no duration text"))?;
    let distance_text =
        text_field(leg, "distance").ok_or_else(|| malformed("leg has no distance text"))?;

    let encoded = route
        .get("overview_polyline")
        .and_then(|p| p.get("points"))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("route has no overview polyline"))?;

    let path = polyline::decode(encoded)?;

    Ok(Some(RouteResult {
        path,
        eta_text,
        distance_text,
    }))
}

fn text_field(leg: &Value, key: &str) -> Option<String> {
    leg.get(key)?.get("text")?.as_str().map(str::to_owned)
}

fn malformed(what: &str) -> NavError {
    NavError::MalformedResponse(what.to_string())
}
