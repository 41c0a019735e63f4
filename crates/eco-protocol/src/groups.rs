//! Species-group to taxonomic-class mapping.

/// Map a query-string species group to its canonical taxonomic class.
///
/// Returns `None` for unknown groups, which callers treat as "no filter".
pub fn group_class(group: &str) -> Option<&'static str> {
    match group.to_ascii_lowercase().as_str() {
        "birds" => Some("Aves"),
        "mammals" => Some("Mammalia"),
        "amphibians" => Some("Amphibia"),
        "reptiles" => Some("Reptilia"),
        _ => None,
    }
}
