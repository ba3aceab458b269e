//! Fixed-decimal helpers applied at the response boundary

/// Round `value` half away from zero to `places` decimal places
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Render `value` with exactly `places` decimal places
pub fn format_fixed(value: f64, places: usize) -> String {
    format!("{:.*}", places, value)
}
