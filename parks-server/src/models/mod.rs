//! Domain values with validation at construction
//!
//! Request bodies are converted into these types before they reach the
//! repositories. Invalid input returns ValidationError, not panic.

pub mod contact;
pub mod geo;
pub mod link;
pub mod pagination;
pub mod review;
pub mod species;
pub mod trail;
pub mod validation;

pub use geo::Coordinates;
pub use link::SightingProbability;
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use review::Rating;
pub use species::SpeciesType;
pub use trail::{Difficulty, TrailType};
pub use validation::{ValidationError, MAX_NAME_LEN};
