pub mod file;
pub mod memory;
pub mod session;
pub mod traits;

pub use file::{load_run_record, load_task_set, save_run_record, save_task_set};
pub use memory::InMemoryRunStore;
pub use session::{RunSession, RunSummary, SessionState};
pub use traits::RunStore;
