/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const DOCUMENTS_ROUTE_COMPONENT: &str = "documents";
pub const DOCUMENTS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", DOCUMENTS_ROUTE_COMPONENT);

pub const EXTRACTED_EVENTS_ROUTE_COMPONENT: &str = "extracted-events";
pub const CANDIDATES_ROUTE_COMPONENT: &str = "candidates";
pub const SERIES_ROUTE_COMPONENT: &str = "series";

/// Header carrying the owning user for uploads. Authentication lives upstream.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Maximum number of lines sent to the completion service in one request.
pub const EXTRACTION_BATCH_SIZE: usize = 10;

/// Confidence assigned to results that carry a normalized date.
pub const CONFIDENCE_NORMALIZED: i16 = 90;
/// Confidence assigned to deferred range-with-weekday results.
pub const CONFIDENCE_DEFERRED_RANGE: i16 = 85;
/// Confidence assigned when only the raw date text survived.
pub const CONFIDENCE_RAW_DATE: i16 = 70;
