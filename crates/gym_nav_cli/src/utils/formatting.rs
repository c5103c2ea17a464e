pub fn truncate_ellipsis(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width - 1).collect();
    out.push('…');
    out
}

/// `850 m` below one kilometre, `1.2 km` above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Right-aligned keys; multi-line values are indented under the first line.
pub fn print_kv_block<F>(pairs: &[(&str, String)], color_key: F)
where
    F: Fn(&str) -> String,
{
    let key_w = pairs
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0);

    for (k, v) in pairs {
        let key_col = color_key(&format!("{k:>key_w$}"));
        let mut lines = v.trim_end_matches('\n').lines();
        println!("{}: {}", key_col, lines.next().unwrap_or(""));
        for line in lines {
            println!("{:>key_w$}  {}", "", line);
        }
    }
}
