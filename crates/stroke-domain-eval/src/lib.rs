pub mod gate;
pub mod held;
pub mod matcher;
pub mod tolerance;

pub use gate::*;
pub use held::*;
pub use matcher::*;
pub use tolerance::*;
