pub mod loader;

pub use loader::{discover_input_files, load_file, load_records, InputFileError, LoadReport, SkippedFile};
