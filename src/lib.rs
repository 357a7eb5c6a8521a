pub mod error;
pub mod export;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod table;

pub use error::{PersistenceFailed, SourceError};
pub use table::{NormalizedTable, RawCell, RawTable, Value};
