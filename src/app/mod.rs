pub mod app;
pub mod repository;
pub mod session;

pub use app::App;
pub use repository::{ConversationField, Repository, Updated, update_conversation};
pub use session::{Cycle, Outcome, Session, StopHandle};
