// Pokemon Battle Schema - Shared type definitions
// This crate contains the core enums and data types shared between the
// battle engine, the session layer and the remote service clients.

// Re-export the main types
pub use pokemon_types::*;
pub use skill_data::*;
pub use species_data::*;

pub mod pokemon_types;
pub mod skill_data;
pub mod species_data;
