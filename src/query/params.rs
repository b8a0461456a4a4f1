use std::collections::HashMap;
use tracing::warn;

/// Legacy to canonical date parameter renames, in rewrite order. Two legacy
/// spellings exist per canonical key; the first one processed wins.
const DATE_KEY_RENAMES: [(&str, &str); 4] = [
    ("date_range_0", "date_range_after"),
    ("date_range_1", "date_range_before"),
    ("date_from", "date_range_after"),
    ("date_to", "date_range_before"),
];

/// Rewrites legacy date parameter keys to their canonical names.
///
/// A legacy key is dropped outright when its canonical key is already
/// present — the canonical value wins, values are never merged. Otherwise
/// the legacy key is renamed. Keys outside the rename table pass through
/// untouched, so normalizing an already-canonical map is a no-op.
pub fn normalize_date_params(params: &mut HashMap<String, String>) {
    for (legacy, canonical) in DATE_KEY_RENAMES {
        if !params.contains_key(legacy) {
            continue;
        }

        if params.contains_key(canonical) {
            warn!("Ignoring search parameter [{legacy}], using [{canonical}] only");
            params.remove(legacy);
            continue;
        }

        warn!("Converting search parameter [{legacy}] to new-style [{canonical}]");
        if let Some(value) = params.remove(legacy) {
            params.insert(canonical.to_string(), value);
        }
    }
}
