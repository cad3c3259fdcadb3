#[macro_use]
mod macros;

pub mod circle;
pub mod error;
pub mod primitive;
pub mod rtree;

pub use circle::Circle;
pub use error::{ConfigError, InsertError};
pub use primitive::AabbRect;
pub use rtree::{Element, Inserted, RTree, TreeNodeIndex, TreeParameter};

// Reexport necessary items.
pub use slotmap::Key;
