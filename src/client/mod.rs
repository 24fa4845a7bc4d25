//! Upload client: local file checks, the upload call and the five-step
//! progress display driven by the server's answer.

pub mod error;
pub mod render;
pub mod selection;
pub mod session;
pub mod state;
pub mod uploader;

pub use error::ClientError;
pub use render::TerminalView;
pub use selection::SelectedImage;
pub use session::{Pacing, ProgressObserver, Session, SubmitOutcome};
pub use state::{ProcessingState, StepStatus, UiState};
pub use uploader::{HttpUploader, Uploader};
