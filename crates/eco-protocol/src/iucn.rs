//! IUCN Red List category tables.
//!
//! Codes, display names, and the chart colors used by the dashboard.

/// All IUCN codes the dashboard tallies, in display order.
///
/// `NOT_EVALUATED` is our stand-in for rows with a blank or missing
/// category column.
pub const IUCN_CODES: &[&str] = &[
    "CR", "EN", "VU", "NT", "LC", "DD", "EW", "EX", "NOT_EVALUATED",
];

/// Codes counted as endangered.
///
/// Policy: Critically Endangered, Endangered, and Vulnerable, applied
/// per distinct species, uniformly across both report endpoints.
pub const ENDANGERED_CODES: &[&str] = &["CR", "EN", "VU"];

/// Whether an IUCN code falls in the endangered set.
pub fn is_endangered(code: &str) -> bool {
    ENDANGERED_CODES.contains(&code)
}

/// Chart color for an IUCN code. Unknown codes get a neutral gray.
pub fn iucn_color(code: &str) -> &'static str {
    match code {
        "CR" => "#ef4444",
        "EN" => "#dc2626",
        "VU" => "#f97316",
        "NT" => "#eab308",
        "LC" => "#22c55e",
        "DD" => "#94a3b8",
        "EW" => "#6366f1",
        "EX" => "#000000",
        "NOT_EVALUATED" => "#64748b",
        _ => "#999999",
    }
}
