mod logging;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use brag_core::{BragSheetPipeline, Execution, MergeEvent, PipelineConfig, RecursiveMerger};
use brag_llm::{create_client, Config};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "brag")]
#[command(about = "Condense saved summaries into one brag sheet")]
#[command(version)]
struct Cli {
    /// Tone requested in merge prompts
    #[arg(long, global = true)]
    tone: Option<String>,

    /// Model hint passed to the backend
    #[arg(long, global = true)]
    model: Option<String>,

    /// Soft token ceiling per batch
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Batches estimated above this are split before summarizing
    #[arg(long, global = true)]
    hard_ceiling: Option<u32>,

    /// Run up to N backend calls at once
    #[arg(long, global = true, value_name = "N")]
    concurrent: Option<usize>,

    /// Enable debug logging and progress output
    #[arg(long, short, global = true, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recursively merge already-summarized sections
    Merge {
        /// JSON array of strings
        file: PathBuf,
    },
    /// Summarize raw items in chunks, then merge the chunk summaries
    Generate {
        /// JSON array of strings
        file: PathBuf,

        /// Write the first-pass summaries here as a JSON array, for replay
        /// with `brag merge`
        #[arg(long, value_name = "PATH")]
        save_summaries: Option<PathBuf>,
    },
}

impl Cli {
    fn pipeline_config(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(tone) = &self.tone {
            config = config.with_tone(tone.clone());
        }
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens_per_batch(max_tokens);
        }
        if let Some(ceiling) = self.hard_ceiling {
            config = config.with_hard_ceiling(ceiling);
        }
        if let Some(max_in_flight) = self.concurrent {
            config = config.with_execution(Execution::Concurrent { max_in_flight });
        }
        config
    }
}

fn read_items(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let items: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of strings", path.display()))?;
    Ok(items)
}

fn write_items(path: &Path, items: &[String]) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(items)?;
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn describe(event: &MergeEvent) -> String {
    match event {
        MergeEvent::RoundStarted {
            depth,
            round,
            units,
            batches,
        } => format!("[depth {depth}] round {round}: {units} units in {batches} batches"),
        MergeEvent::BatchSummarized {
            depth,
            round,
            batch,
            input_tokens,
        } => format!("[depth {depth}] round {round}: batch {batch} summarized (~{input_tokens} tokens)"),
        MergeEvent::BatchSplit {
            depth,
            round,
            batch,
            tokens,
            parts,
        } => format!("[depth {depth}] round {round}: batch {batch} (~{tokens} tokens) split into {parts} parts"),
        MergeEvent::Converged { depth, rounds } => {
            format!("[depth {depth}] converged after {rounds} rounds")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let config = Config::new();
    let pipeline_config = cli.pipeline_config(config.pipeline.clone());
    pipeline_config.validate()?;

    let client = create_client(&config)?;

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            ctrl_c_token.cancel();
        }
    });

    let (tx, mut rx) = mpsc::channel::<MergeEvent>(64);
    let debug = cli.debug;
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if debug {
                eprintln!("{}", describe(&event));
            }
        }
    });

    let merger = RecursiveMerger::new(client, pipeline_config)
        .with_cancel_token(cancel_token)
        .with_events(tx);

    let pipeline = BragSheetPipeline::from_merger(merger);

    let start = Instant::now();
    let result = match &cli.command {
        Commands::Merge { file } => {
            let items = read_items(file)?;
            log::info!("Merging {} sections from {}", items.len(), file.display());
            pipeline.merger().merge(items).await
        }
        Commands::Generate {
            file,
            save_summaries: None,
        } => {
            let items = read_items(file)?;
            log::info!("Generating brag sheet from {} items in {}", items.len(), file.display());
            pipeline.generate(items).await
        }
        Commands::Generate {
            file,
            save_summaries: Some(path),
        } => {
            let items = read_items(file)?;
            log::info!("Generating brag sheet from {} items in {}", items.len(), file.display());
            match pipeline.first_pass(items).await {
                Ok(summaries) => {
                    match write_items(path, &summaries) {
                        Ok(()) => log::info!("Saved {} summaries to {}", summaries.len(), path.display()),
                        Err(e) => log::warn!("Could not save summaries: {:#}", e),
                    }
                    pipeline.merger().merge(summaries).await
                }
                Err(e) => Err(e),
            }
        }
    };

    // Closes the event channel so the progress task can finish.
    drop(pipeline);
    let _ = progress.await;

    let summary = result?;
    log::info!("Finished in {:.1}s", start.elapsed().as_secs_f64());
    println!("{}", summary);
    Ok(())
}
