//! Routing service client and per-pair resolution

use crate::config::RoutingConfig;
use crate::error::RoutingError;
use crate::types::{CoordinatePair, RouteSummary};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can answer "how far, how long" for two points given in
/// routing order (`lon,lat`)
pub trait RouteService {
    fn route(&self, start: &str, destination: &str) -> Result<RouteSummary, RoutingError>;
}

/// OSRM-compatible HTTP client
pub struct OsrmClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    distance: f64,
    duration: f64,
}

impl OsrmClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("roadsheet/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, start: &str, destination: &str) -> String {
        format!(
            "{}/{};{}?overview=false",
            self.base_url, start, destination
        )
    }
}

impl RouteService for OsrmClient {
    fn route(&self, start: &str, destination: &str) -> Result<RouteSummary, RoutingError> {
        let url = self.url(start, destination);
        debug!(%url, "requesting route");

        let response: RouteResponse = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json()?;

        if response.code != "Ok" {
            return Err(RoutingError::Service {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }

        let route = response.routes.first().ok_or(RoutingError::NoRoute)?;
        Ok(RouteSummary {
            distance: route.distance,
            duration: route.duration,
        })
    }
}

/// Convert "latitude, longitude" free text into the routing service's
/// "longitude,latitude" order
pub fn to_routing_order(coordinate: &str) -> Result<String, RoutingError> {
    let parts: Vec<&str> = coordinate.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [lat, lon] if is_number(lat) && is_number(lon) => Ok(format!("{},{}", lon, lat)),
        _ => Err(RoutingError::Coordinate(coordinate.to_string())),
    }
}

fn is_number(s: &str) -> bool {
    s.parse::<f64>().map(|v| v.is_finite()).unwrap_or(false)
}

/// Resolve every pair in extraction order.
///
/// Success records the route; failure appends an error. A pair never ends up
/// with both.
pub fn resolve_pairs(pairs: &mut [CoordinatePair], service: &dyn RouteService) {
    for pair in pairs.iter_mut() {
        let converted = to_routing_order(&pair.start)
            .and_then(|start| Ok((start, to_routing_order(&pair.destination)?)));

        let (start, destination) = match converted {
            Ok(points) => points,
            Err(e) => {
                warn!(start = %pair.start, destination = %pair.destination, "{}", e);
                pair.push_error(e.to_string());
                continue;
            }
        };

        match service.route(&start, &destination) {
            Ok(route) => {
                pair.record_route(route);
            }
            Err(e) => {
                warn!(start = %pair.start, destination = %pair.destination, "route request failed: {}", e);
                pair.push_error(format!("Failed API request: {}", e));
            }
        }
    }
}
