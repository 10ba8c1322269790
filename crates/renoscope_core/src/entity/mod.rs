//! Entity row types.

mod media;
mod property;
mod scope_item;

pub use media::Media;
pub use property::{Property, PropertyStatus};
pub use scope_item::{Complexity, PermitLikelihood, ScopeItem};
