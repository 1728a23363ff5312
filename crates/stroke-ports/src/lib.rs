pub mod midi;
pub mod storage;
pub mod transport;
pub mod types;

pub use midi::*;
pub use storage::*;
pub use transport::*;
pub use types::*;
