pub mod codec;
pub mod error;
pub mod hash;
pub mod local;
pub mod logging;
pub mod naming;
pub mod record;
pub mod task;
pub mod worker;

pub use error::MapError;
pub use record::{KeyValue, KeyValues};
pub use task::{MapTask, OutputMode};
pub use worker::{execute_map_task, MapFn, MapTaskOutput, Worker};
