use anyhow::{Context, Result, bail};

use gym_nav_core::config::{API_KEY_ENV, NavConfig};
use gym_nav_core::directions::{DirectionsClient, RoutePlanner};
use gym_nav_core::geo::haversine_m;
use gym_nav_core::{LatLng, RouteResult, polyline};

use crate::cli::color::Colors;
use crate::ui::{Style, success, warning};
use crate::utils::formatting::{format_distance, print_kv_block};

pub fn run(
    config: &NavConfig,
    from: (f64, f64),
    to: (f64, f64),
    show_polyline: bool,
    json: bool,
) -> Result<()> {
    let origin = LatLng::new(from.0, from.1);
    let destination = LatLng::new(to.0, to.1);

    let client = DirectionsClient::new(&config.directions)?;
    if !client.has_api_key() {
        bail!(
            "No directions API key configured.\nSet {API_KEY_ENV} or directions.api_key in the config file."
        );
    }

    let route = client
        .plan_route(origin, destination)
        .with_context(|| format!("Planning a driving route {origin} -> {destination}"))?;

    let Some(route) = route else {
        warning(format!("No driving route found from {origin} to {destination}."));
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&route)?);
        return Ok(());
    }

    print_route(&route, origin, destination, show_polyline);
    Ok(())
}

pub fn print_route(route: &RouteResult, origin: LatLng, destination: LatLng, show_polyline: bool) {
    let colors = Colors::new(&Style::default());

    println!();
    success("Route planned");
    println!();

    let mut pairs = vec![
        ("From", origin.to_string()),
        ("To", destination.to_string()),
        ("ETA", colors.ok(&route.eta_text)),
        ("Distance", route.distance_text.clone()),
        ("Points", route.path.len().to_string()),
        ("Straight line", format_distance(haversine_m(origin, destination))),
    ];
    if show_polyline {
        pairs.push(("Polyline", polyline::encode(&route.path)));
    }

    print_kv_block(&pairs, |k| colors.key(k));
}
