//! Postcode string helpers.
//!
//! Two different prefixes of a UK postcode matter here:
//! - the *area* — everything strictly before the first digit ("WV1 1AA" → "WV").
//!   The polygon host publishes one GeoJSON file per area.
//! - the *district* (outcode) — everything before the first space
//!   ("WV1 1AA" → "WV1"). Polygon features are named by district, so it is
//!   the join key for aggregation.

/// Return the substring strictly before the first ASCII digit.
///
/// If the input contains no digit, it is returned unchanged; an empty
/// string yields an empty string.
pub fn extract_outcode(postcode: &str) -> &str {
    match postcode.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => &postcode[..idx],
        None => postcode,
    }
}

/// Return the district (outcode) of a postcode: the token before the first
/// space, or the whole string when there is no space.
pub fn district(postcode: &str) -> &str {
    postcode.split(' ').next().unwrap_or(postcode)
}
