mod shape;
mod storage;

pub use shape::BatchShape;
pub use storage::{ParseLayoutError, StorageLayout};
