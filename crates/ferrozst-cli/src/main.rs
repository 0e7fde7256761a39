//! ferrozst - streaming Zstandard compression from the command line
//!
//! Files are read in fixed-size chunks and pushed through the ferrozst stream
//! pipeline, so memory use stays flat regardless of file size.

mod display;
mod progress;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use ferrozst_compression::{
    default_codec, initialize, CompressOptions, DecompressOptions, StreamEngine, StreamPipeline,
};
use ferrozst_config::{Config, ConfigLoader};
use ferrozst_types::{ChunkSize, CompressionLevel, StreamKind, StreamStats};
use progress::ByteProgress;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

/// ferrozst - streaming Zstandard compression
#[derive(Parser)]
#[command(
    name = "ferrozst",
    version = env!("CARGO_PKG_VERSION"),
    about = "Streaming Zstandard compression",
    long_about = "ferrozst compresses and decompresses files as Zstandard frames.\n\
                  Input is streamed chunk by chunk through a backpressure-aware\n\
                  pipeline, so arbitrarily large files use constant memory."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a Zstandard frame
    Compress {
        /// File to compress
        input: PathBuf,
        /// Where to write the frame
        output: PathBuf,
        /// Compression level (1-19)
        #[arg(short, long)]
        level: Option<i32>,
        /// Read size in bytes
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Decompress one or more concatenated Zstandard frames
    Decompress {
        /// Compressed file
        input: PathBuf,
        /// Where to write the decompressed data
        output: PathBuf,
        /// Read size in bytes
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
        /// Write the default configuration to this file
        #[arg(long, value_name = "PATH")]
        generate: Option<PathBuf>,
    },
}

/// Settings for one compress or decompress run
#[derive(Debug, Clone, Copy)]
struct StreamSettings {
    level: CompressionLevel,
    chunk_size: ChunkSize,
    quiet: bool,
}

impl StreamSettings {
    fn resolve(
        config: &Config,
        level: Option<i32>,
        chunk_size: Option<usize>,
        quiet: bool,
    ) -> Result<Self> {
        let level = match level {
            Some(level) => CompressionLevel::new(level)?,
            None => config.compression.level,
        };
        let chunk_size = match chunk_size {
            Some(size) => ChunkSize::new(size)?,
            None => config.stream.chunk_size,
        };
        Ok(Self {
            level,
            chunk_size,
            quiet,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load_default()?,
    };

    init_logging(cli.debug, cli.quiet, cli.verbose, &config.logging.level)?;
    console::set_colors_enabled(config.logging.colored_output);

    info!("ferrozst v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            chunk_size,
        } => {
            let settings = StreamSettings::resolve(&config, level, chunk_size, cli.quiet)?;
            run_stream_command(StreamKind::Compress, &input, &output, settings).await?;
        }
        Commands::Decompress {
            input,
            output,
            chunk_size,
        } => {
            let settings = StreamSettings::resolve(&config, None, chunk_size, cli.quiet)?;
            run_stream_command(StreamKind::Decompress, &input, &output, settings).await?;
        }
        Commands::Config { default, generate } => {
            config_command(&config, default, generate)?;
        }
    }

    Ok(())
}

fn init_logging(debug: bool, quiet: bool, verbose: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        configured
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log filter")?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

async fn run_stream_command(
    kind: StreamKind,
    input: &Path,
    output: &Path,
    settings: StreamSettings,
) -> Result<()> {
    info!("{} {} -> {}", kind, input.display(), output.display());

    if !settings.quiet {
        println!(
            "{} {} {} to {}",
            style("→").green().bold(),
            match kind {
                StreamKind::Compress => "Compressing",
                StreamKind::Decompress => "Decompressing",
            },
            style(input.display()).cyan(),
            style(output.display()).cyan()
        );
    }

    initialize().await.context("codec engine failed to load")?;

    let started = Instant::now();
    let progress = ByteProgress::new(settings.quiet, &kind.to_string());
    let result = stream_file(kind, input, output, settings, &progress).await;

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            progress.finish_and_clear();
            if let Err(cleanup) = tokio::fs::remove_file(output).await {
                debug!("could not remove partial output: {}", cleanup);
            }
            return Err(e);
        }
    };
    progress.finish("done");

    if !settings.quiet {
        display::print_stream_summary(kind, output, &stats, started.elapsed());
    }
    info!(
        "{} finished: {} bytes in, {} bytes out",
        kind, stats.bytes_in, stats.bytes_out
    );
    Ok(())
}

/// Stream `input` through a pipeline of `kind` into `output`
async fn stream_file(
    kind: StreamKind,
    input: &Path,
    output: &Path,
    settings: StreamSettings,
    progress: &ByteProgress,
) -> Result<StreamStats> {
    let source = File::open(input)
        .await
        .with_context(|| format!("cannot open {}", input.display()))?;
    let upstream = ReaderStream::with_capacity(source, settings.chunk_size.get());
    let codec = default_codec();

    let stats = match kind {
        StreamKind::Compress => {
            let options = CompressOptions {
                level: settings.level.get(),
                on_progress: progress.reporter(),
            };
            let pipeline = codec.compress_stream(upstream, options).await?;
            write_pipeline(pipeline, output).await?
        }
        StreamKind::Decompress => {
            let options = DecompressOptions {
                on_progress: progress.reporter(),
            };
            let pipeline = codec.decompress_stream(upstream, options).await?;
            write_pipeline(pipeline, output).await?
        }
    };
    Ok(stats)
}

async fn write_pipeline<E>(mut pipeline: StreamPipeline<E>, output: &Path) -> Result<StreamStats>
where
    E: StreamEngine + Unpin,
{
    let file = File::create(output)
        .await
        .with_context(|| format!("cannot create {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    while let Some(chunk) = pipeline.pull().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .with_context(|| format!("cannot write {}", output.display()))?;
    }
    writer.flush().await?;

    Ok(pipeline.stats())
}

fn config_command(current: &Config, default: bool, generate: Option<PathBuf>) -> Result<()> {
    if let Some(path) = generate {
        ConfigLoader::generate_default_config(&path)?;
        println!(
            "{} Wrote default configuration to {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
        return Ok(());
    }

    let (heading, config) = if default {
        ("Default configuration:", Config::default())
    } else {
        if ConfigLoader::config_exists().is_none() {
            warn!("no configuration file found; showing defaults and environment overrides");
        }
        ("Current configuration:", current.clone())
    };
    let rendered = serde_yaml::to_string(&config)?;
    display::print_config(heading, &config, &rendered);
    Ok(())
}
