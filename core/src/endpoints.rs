//! Endpoints shared by every API, and path template rendering.

/// Liveness check, present on every API.
pub const ALIVE: &str = "alive";

/// Replaces each `<name>` placeholder of `template` with its value.
/// Placeholders without a value are left untouched.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |path, (name, value)| {
            path.replace(&format!("<{name}>"), value)
        })
}
