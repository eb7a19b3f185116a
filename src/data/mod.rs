//! Data module - CSV loading, inspection and cleaning

mod inspector;
mod loader;
mod normalizer;

pub use inspector::DataInspector;
pub use loader::{is_numeric_dtype, DataLoader, LoaderError};
pub use normalizer::{DataNormalizer, NormalizeError, DATE_COLUMN};
