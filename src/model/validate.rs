// ── Document Model: Structural Invariants ──────────────────────────────────
//
// Enforced at construction and on deserialization boundaries: type-tag
// validity (via strongly-typed enums, for free), coordinate sanity,
// ordering, node-id uniqueness, edge closure. Every boundary (API, AI
// output, store) calls `validate_itinerary` before accepting a document,
// per spec.md §4.1 and the Design Notes' "revalidate at every boundary"
// directive.

use crate::atoms::error::{EngineError, EngineResult};

use super::day::Day;
use super::itinerary::Itinerary;
use super::node::Location;

pub fn validate_location(loc: &Location) -> EngineResult<()> {
    if let Some(lat) = loc.lat {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(EngineError::validation(format!("latitude out of range: {lat}")));
        }
    }
    if let Some(lng) = loc.lng {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(EngineError::validation(format!("longitude out of range: {lng}")));
        }
    }
    Ok(())
}

pub fn validate_day(day: &Day) -> EngineResult<()> {
    for node in &day.nodes {
        validate_location(&node.location)?;
    }
    if !day.edges_closed() {
        return Err(EngineError::validation(format!(
            "day {} has an edge referencing a node outside the day",
            day.day_number
        )));
    }
    Ok(())
}

pub fn validate_itinerary(itinerary: &Itinerary) -> EngineResult<()> {
    if itinerary.version < 1 {
        return Err(EngineError::validation("version must be >= 1"));
    }
    if itinerary.status != super::itinerary::ItineraryStatus::Planning && itinerary.days.is_empty()
    {
        return Err(EngineError::validation(
            "days must be non-empty for any status other than planning",
        ));
    }
    if !itinerary.day_numbers_contiguous() {
        return Err(EngineError::validation(
            "day numbers must be unique and 1-based contiguous",
        ));
    }
    if !itinerary.node_ids_unique() {
        return Err(EngineError::validation("duplicate node id within itinerary"));
    }
    for day in &itinerary.days {
        validate_day(day)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_latitude() {
        let loc = Location { name: "x".into(), address: None, lat: Some(200.0), lng: None };
        assert!(validate_location(&loc).is_err());
    }

    #[test]
    fn accepts_valid_coordinates() {
        let loc = Location { name: "x".into(), address: None, lat: Some(41.4), lng: Some(2.17) };
        assert!(validate_location(&loc).is_ok());
    }
}
