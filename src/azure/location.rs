//! Azure region names

/// Canonical form of a location: lowercase with spaces removed.
/// `"West Europe"` and `"westeurope"` name the same region.
pub fn normalize_location(location: &str) -> String {
    location.replace(' ', "").to_lowercase()
}
