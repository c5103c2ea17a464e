use anyhow::{Result, bail};

pub const TIP_NEGATIVE_COORDS: &str =
    "Note: negative coordinates are accepted as-is, e.g.:\n  find --lat -33.86 --lon 151.21";

pub fn validate_coords(lat: f64, lon: f64, ctx: &str) -> Result<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        bail!("Invalid latitude for {ctx}: {lat} (must be within -90..=90)\n{TIP_NEGATIVE_COORDS}");
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        bail!(
            "Invalid longitude for {ctx}: {lon} (must be within -180..=180)\n{TIP_NEGATIVE_COORDS}"
        );
    }
    Ok(())
}

pub fn validate_radius(radius: u32) -> Result<()> {
    if radius == 0 {
        bail!("--radius must be > 0.");
    }
    Ok(())
}

pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        bail!("--limit must be > 0.");
    }
    Ok(())
}

pub fn validate_pick(pick: usize) -> Result<()> {
    if pick == 0 {
        bail!("--pick is 1-based and must be > 0.");
    }
    Ok(())
}

pub fn validate_speed(speed: f64) -> Result<()> {
    if !speed.is_finite() || speed <= 0.0 {
        bail!("--speed must be a positive number, got {speed}.");
    }
    Ok(())
}

pub fn validate_route_endpoints(from: (f64, f64), to: (f64, f64)) -> Result<()> {
    validate_coords(from.0, from.1, "--from")?;
    validate_coords(to.0, to.1, "--to")?;
    if from == to {
        bail!("FROM and TO must be different");
    }
    Ok(())
}
