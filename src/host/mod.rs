mod buffer;
mod strided_batch_vector;
mod view;

pub use buffer::HostBuffer;
pub use strided_batch_vector::HostStridedBatchVector;
pub use view::{BatchView, BatchViewMut};
