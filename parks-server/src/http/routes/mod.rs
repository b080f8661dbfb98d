//! Route handlers organized by resource

pub mod auth;
pub mod badges;
pub mod health;
pub mod media;
pub mod parks;
pub mod reviews;
pub mod sightings;
pub mod species;
pub mod trails;
pub mod weather;
