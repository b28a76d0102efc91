mod records;
mod resolver;

pub use records::{AdminRecord, GuruRecord, Identity, MuridProfile, MuridRecord, NewAccount};
pub use resolver::IdentityResolver;
