use std::{num::NonZeroUsize, path::PathBuf, sync::Arc};

use clap::Parser;
use mr::{
    local::run_map_tasks, logging::init_tracing, naming::DirectoryNaming, KeyValue, MapTask,
    OutputMode, Worker,
};
use tracing::info;

/// Run the word-count map phase over several inputs at once, one map task
/// per input file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long)]
    job: String,

    #[arg(long)]
    n_reduce: NonZeroUsize,

    #[arg(long, default_value = ".")]
    dir: PathBuf,

    #[arg(long)]
    grouped: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn map_function(_key: &str, value: &str) -> anyhow::Result<Vec<KeyValue>> {
    Ok(value
        .split_whitespace()
        .map(|word| KeyValue::new(word, "1"))
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mode = if args.grouped {
        OutputMode::Grouped
    } else {
        OutputMode::Streaming
    };
    let worker = Arc::new(
        Worker::new(map_function)
            .with_naming(DirectoryNaming::new(&args.dir))
            .with_output_mode(mode),
    );
    let tasks = args
        .inputs
        .iter()
        .enumerate()
        .map(|(i, input)| MapTask::new(args.job.as_str(), i, input, args.n_reduce))
        .collect();

    let outputs = run_map_tasks(worker, tasks).await?;
    let total: usize = outputs.iter().map(|o| o.total_records()).sum();
    info!("map phase done: {} tasks, {} records", outputs.len(), total);
    for output in &outputs {
        for file in &output.files {
            println!("{}", file.display());
        }
    }
    Ok(())
}
