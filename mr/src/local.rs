//! Runs several map tasks of one job side by side on this host.
//!
//! Tasks never share an output file (names are keyed by map task), so they
//! run without any coordination, each on its own blocking thread.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{error, info};

use crate::{
    error::MapError,
    naming::ShardNaming,
    task::MapTask,
    worker::{MapTaskOutput, Worker},
};

pub async fn run_map_tasks<N>(
    worker: Arc<Worker<N>>,
    tasks: Vec<MapTask>,
) -> Result<Vec<MapTaskOutput>, MapError>
where
    N: ShardNaming + Send + Sync + 'static,
{
    info!("running {} map tasks", tasks.len());
    let handles = tasks.into_iter().map(|task| {
        let worker = Arc::clone(&worker);
        let map_task = task.get_map_task();
        async move {
            match tokio::task::spawn_blocking(move || worker.do_map(&task)).await {
                Ok(result) => result,
                Err(e) => {
                    error!("map task {} did not complete: {}", map_task, e);
                    Err(MapError::TaskPanicked { map_task })
                }
            }
        }
    });
    try_join_all(handles).await
}
