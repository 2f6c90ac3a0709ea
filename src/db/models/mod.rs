pub mod record;

pub use record::{DataRecord, NewRecord, Sentiment, StoreStats};
