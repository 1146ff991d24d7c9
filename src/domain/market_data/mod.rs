//! Market data aggregate containing entities and value objects.

pub mod entities;
pub mod overlay;
pub mod value_objects;

pub use entities::*;
pub use overlay::*;
pub use value_objects::*;
