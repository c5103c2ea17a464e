use anyhow::{Context, Result};

use gym_nav_core::config::NavConfig;
use gym_nav_core::geo::haversine_m;
use gym_nav_core::poi::{OverpassClient, PoiFinder};
use gym_nav_core::{LatLng, PointOfInterest};

use crate::cli::color::Colors;
use crate::ui::{Style, info, warning};
use crate::utils::formatting::{format_distance, truncate_ellipsis};

const NAME_WIDTH: usize = 32;

pub fn run(config: &NavConfig, lat: f64, lon: f64, radius: u32, limit: usize) -> Result<()> {
    let center = LatLng::new(lat, lon);
    let client = OverpassClient::new(&config.poi)?;

    let pois = client
        .find_pois(center, radius)
        .with_context(|| format!("Searching gyms around {center} via {}", client.endpoint()))?;

    if pois.is_empty() {
        warning(format!("No gyms found within {radius} m of {center}."));
        return Ok(());
    }

    let rows = by_distance(center, pois);
    let colors = Colors::new(&Style::default());

    println!();
    info(format!(
        "Found {} gym(s) within {radius} m of {center}:",
        rows.len()
    ));
    println!();
    println!("{:>3}  {:<NAME_WIDTH$}  {:>9}  {:<23}  ID", "#", "Name", "Distance", "Position");

    for (i, (poi, meters)) in rows.iter().take(limit).enumerate() {
        let name = truncate_ellipsis(poi.display_name(), NAME_WIDTH);
        println!(
            "{:>3}  {}  {:>9}  {:<23}  {}",
            i + 1,
            colors.gym_name(format!("{name:<NAME_WIDTH$}"), poi.name.is_some()),
            format_distance(*meters),
            poi.position().to_string(),
            colors.dim(poi.id.to_string())
        );
    }

    if rows.len() > limit {
        println!();
        info(format!("... {} more (use --limit)", rows.len() - limit));
    }

    Ok(())
}

/// Closest first; ties keep the service order.
pub fn by_distance(center: LatLng, pois: Vec<PointOfInterest>) -> Vec<(PointOfInterest, f64)> {
    let mut rows: Vec<_> = pois
        .into_iter()
        .map(|p| {
            let d = haversine_m(center, p.position());
            (p, d)
        })
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(id: i64, lat: f64) -> PointOfInterest {
        PointOfInterest {
            id,
            name: None,
            latitude: lat,
            longitude: 7.68,
        }
    }

    #[test]
    fn rows_are_sorted_closest_first() {
        let center = LatLng::new(45.0, 7.68);
        let rows = by_distance(center, vec![poi(1, 45.02), poi(2, 45.001), poi(3, 45.01)]);
        let ids: Vec<i64> = rows.iter().map(|(p, _)| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(rows[0].1 < rows[1].1);
    }
}
