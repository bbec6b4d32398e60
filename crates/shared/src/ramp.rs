//! Peace percentage colour ramp.
//!
//! The map layers use the linear MapLibre expression from [`ramp_expression`];
//! legends and the stats panel use the stepped [`ramp_color`] so a value is
//! always shown with the colour of the breakpoint at or below it.
use serde_json::{json, Value};

/// Breakpoints: red, orange, yellow, light green, dark green.
pub const PEACE_RAMP: [(f64, &str); 5] = [
    (0.0, "#ff0000"),
    (25.0, "#ff6600"),
    (50.0, "#ffcc00"),
    (75.0, "#99ff33"),
    (100.0, "#00cc00"),
];

/// Colour for features without a percentage.
pub const NO_DATA_COLOR: &str = "#808080";

/// Clamp a percentage to [0, 100]. Non-finite values count as missing.
pub fn clamp_percentage(p: f64) -> Option<f64> {
    if p.is_finite() {
        Some(p.clamp(0.0, 100.0))
    } else {
        None
    }
}

/// Index of the last breakpoint at or below `p`.
pub fn ramp_bucket(p: f64) -> Option<usize> {
    let p = clamp_percentage(p)?;
    PEACE_RAMP.iter().rposition(|(stop, _)| *stop <= p)
}

pub fn ramp_color(p: Option<f64>) -> &'static str {
    match p.and_then(ramp_bucket) {
        Some(i) => PEACE_RAMP[i].1,
        None => NO_DATA_COLOR,
    }
}

/// MapLibre expression colouring by `property`, grey when absent.
pub fn ramp_expression(property: &str) -> Value {
    let mut interpolate = vec![json!("interpolate"), json!(["linear"]), json!(["get", property])];
    for (stop, color) in PEACE_RAMP {
        interpolate.push(json!(stop));
        interpolate.push(json!(color));
    }
    json!(["case", ["has", property], Value::Array(interpolate), NO_DATA_COLOR])
}

/// "42% for peace", or "0% for peace" without data.
pub fn percentage_label(p: Option<f64>) -> String {
    let pct = p.and_then(clamp_percentage).unwrap_or(0.0).round();
    format!("{pct}% for peace")
}
