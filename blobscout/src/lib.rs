pub mod config;
pub mod decompress;
pub mod errors;
pub mod filters;
pub mod logging;
pub mod output;
pub mod results;
pub mod search;
pub mod store;

pub use config::{FailurePolicy, OutputMode, SearchConfig, SearchPlan};
pub use errors::{SearchError, SearchResult};
pub use results::{ObjectResult, ResultItem, RunStats, SearchReport, Task};
pub use search::search;
pub use store::{LocalStore, MemoryStore, ObjectStore};
