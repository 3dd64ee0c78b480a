pub mod decision;
pub mod enriched;
pub mod listing;
pub mod pipeline;
pub mod projection;
pub mod rent_match;

pub use decision::Decision;
pub use enriched::EnrichedRecord;
pub use listing::{ListingRecord, RentalComparable};
pub use projection::ProjectionConfig;
