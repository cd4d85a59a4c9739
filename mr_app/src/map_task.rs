use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use mr::{logging::init_tracing, naming::DirectoryNaming, KeyValue, MapTask, OutputMode, Worker};
use tracing::info;

/// Run a single word-count map task and write its intermediate shards.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON task descriptor; replaces --job, --map-task, --input and --n-reduce
    #[arg(long, conflicts_with_all = ["job", "map_task", "input", "n_reduce"])]
    task: Option<PathBuf>,

    #[arg(long, required_unless_present = "task")]
    job: Option<String>,

    #[arg(long, required_unless_present = "task")]
    map_task: Option<usize>,

    #[arg(long, required_unless_present = "task")]
    input: Option<PathBuf>,

    #[arg(long, required_unless_present = "task")]
    n_reduce: Option<NonZeroUsize>,

    /// Directory the intermediate files go to
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Write one record per distinct key instead of one per emitted pair
    #[arg(long)]
    grouped: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn to_task(&self) -> anyhow::Result<MapTask> {
        if let Some(path) = &self.task {
            return Ok(MapTask::load(path)?);
        }
        match (&self.job, self.map_task, &self.input, self.n_reduce) {
            (Some(job), Some(map_task), Some(input), Some(n_reduce)) => {
                Ok(MapTask::new(job.as_str(), map_task, input, n_reduce))
            }
            _ => Err(anyhow::anyhow!("missing task arguments")),
        }
    }
}

fn map_function(_key: &str, value: &str) -> anyhow::Result<Vec<KeyValue>> {
    Ok(value
        .split_whitespace()
        .map(|word| KeyValue::new(word, "1"))
        .collect())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let task = args.to_task()?;
    let mode = if args.grouped {
        OutputMode::Grouped
    } else {
        OutputMode::Streaming
    };
    let worker = Worker::new(map_function)
        .with_naming(DirectoryNaming::new(&args.dir))
        .with_output_mode(mode);

    let output = worker
        .do_map(&task)
        .with_context(|| format!("map task {} failed", task.get_map_task()))?;
    info!("wrote {} records", output.total_records());
    for file in &output.files {
        println!("{}", file.display());
    }
    Ok(())
}
