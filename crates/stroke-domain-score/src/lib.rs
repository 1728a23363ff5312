pub mod drums;
pub mod labeling;
pub mod mei_import;
pub mod midi_import;
pub mod model;
pub mod ticks;
pub mod timeline;

pub use drums::*;
pub use labeling::*;
pub use mei_import::*;
pub use midi_import::*;
pub use model::*;
pub use ticks::*;
pub use timeline::*;
