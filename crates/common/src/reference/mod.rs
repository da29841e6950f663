//! Static reference data backing validation
//!
//! Holds the specialty taxonomy, the French administrative gazetteer and the
//! canonical institution list. Detection interprets free text; validation
//! only ever accepts values that map into the data defined here.

pub mod gazetteer;
pub mod institutions;
pub mod specialties;

pub use gazetteer::Gazetteer;
pub use institutions::InstitutionRegistry;
pub use specialties::SpecialtyTaxonomy;
