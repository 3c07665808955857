//! Page buffer pooling.

mod buffer;
mod pool;

#[doc(inline)]
pub use self::buffer::PooledPage;
#[doc(inline)]
pub use self::pool::{BufferPool, PagePool};
