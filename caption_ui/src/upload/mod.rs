pub mod controller;
pub mod file;
pub mod preview;
pub mod session;
pub mod state;

pub use controller::UploadController;
pub use file::ImageFile;
pub use session::{SessionId, SessionRegistry};
pub use state::{PreviewHandle, SessionState, SessionView};
