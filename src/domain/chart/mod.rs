//! Chart aggregate: viewport geometry, crosshair and the state manager that owns them.

pub mod value_objects;
pub mod viewport_manager;

pub use value_objects::*;
pub use viewport_manager::*;
