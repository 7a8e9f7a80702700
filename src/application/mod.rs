pub mod use_cases;

pub use use_cases::auth::{AuthUseCase, SignedIn};
pub use use_cases::import::{ImportSummary, ImportUseCase};
pub use use_cases::maintenance::{LibraryStats, MaintenanceUseCase};
pub use use_cases::snippets::{ListQuery, SnippetUseCase};
