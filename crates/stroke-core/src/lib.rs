pub mod app;
pub mod feedback;
pub mod gate;
pub mod ipc;
pub mod scheduler;
pub mod seek;
pub mod session;
pub mod transport;

pub use app::*;
pub use feedback::*;
pub use gate::*;
pub use ipc::*;
pub use scheduler::*;
pub use seek::*;
pub use session::*;
pub use transport::*;
