
pub mod error;
pub mod provider;
pub mod storage;
pub mod telegram;

// Ré-exports pour faciliter l'import
pub use error::{AppError, AppResult};
pub use provider::ApiFreeClient;
pub use storage::Storage;
pub use telegram::TelegramApi;
