pub mod export;
pub mod history;
mod reading;

pub use export::ExportError;
pub use history::ReadingHistory;
pub use reading::Reading;
