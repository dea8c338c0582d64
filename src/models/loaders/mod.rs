pub mod json_loader;

pub use json_loader::{list_json_files, read_import_file, resolve_import_paths, ImportFile};
