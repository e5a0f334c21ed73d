//! Value override rendering.
//!
//! Each retained `(key, value)` pair becomes one `--set 'key'='value'` token;
//! tokens are joined with a single space in the order the caller supplied
//! them. An allow-list filters pairs out silently, it never fails the build.

/// Render the override text for `overrides`.
///
/// `allowed_keys = None` keeps every pair. `Some(keys)` keeps only pairs whose
/// key appears in `keys`, so `Some(&[])` drops everything.
pub fn render_overrides(overrides: &[(String, String)], allowed_keys: Option<&[String]>) -> String {
    overrides
        .iter()
        .filter(|(key, _)| {
            let keep = allowed_keys.map_or(true, |keys| keys.iter().any(|k| k == key));
            if !keep {
                tracing::debug!("override '{key}' is not in the allow-list; dropped");
            }
            keep
        })
        .map(|(key, value)| format!("--set '{key}'='{value}'"))
        .collect::<Vec<_>>()
        .join(" ")
}
