pub mod admission;
pub mod error;
pub mod handle_race;
pub mod race;
pub mod service;
pub mod variant;
pub mod vehicle;
