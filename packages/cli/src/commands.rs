//! Subcommands of the `resfs` binary.
//!
//! - `provision` - download the manifest's resources into the store
//! - `manifest <dir>` - write a `files.json` listing a project directory
//! - `ls [path]` - list a directory in the store
//! - `cat <path>` - print a file from the store

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};

use resfs::provision::MANIFEST_FILE_NAME;
use resfs::{
    Fetcher, FilesystemBackend, HttpFetcher, LocalFetcher, LogicalPath, NullProgress,
    ProgressSink, ProvisioningPipeline, ResourceManifest, Url,
};

use crate::config::{CliConfig, Overrides};
use crate::error::Result;

/// Options selecting the store, shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// JSON config file with `backend` and `pipeline` sections
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use an in-memory store
    #[arg(long, global = true, conflicts_with = "storage_root")]
    pub ephemeral: bool,

    /// Directory holding persistent stores
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_root: Option<PathBuf>,

    /// Origin the persistent store is scoped to
    #[arg(long, global = true)]
    pub origin: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download the manifest's resources into the store
    Provision {
        /// Server the manifest and resources are fetched from
        #[arg(long)]
        base_url: Option<Url>,

        /// Serve URL paths from a local directory instead of the network
        #[arg(long, value_name = "DIR")]
        from_dir: Option<PathBuf>,

        /// Path in the store every resource is written below
        #[arg(long)]
        project_base: Option<LogicalPath>,

        /// Only report errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Write a files.json manifest listing every file in a project directory
    Manifest {
        dir: PathBuf,

        /// Where to write the manifest (`-` for stdout). Defaults to `<dir>/files.json`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List a directory in the store
    Ls {
        #[arg(default_value = "/")]
        path: LogicalPath,
    },

    /// Print a file from the store
    Cat { path: LogicalPath },
}

/// Progress printed to the terminal.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn status(&self, text: &str) {
        println!("{}", text);
    }

    fn fraction(&self, _value: f64) {}

    fn failure(&self, message: &str) {
        eprintln!("{}", message);
    }
}

pub async fn run(store: StoreArgs, command: Command) -> Result<()> {
    let mut config = CliConfig::load(store.config.as_deref())?;
    let base_url = match &command {
        Command::Provision { base_url, .. } => base_url.clone(),
        _ => None,
    };
    config.apply(Overrides {
        ephemeral: store.ephemeral,
        storage_root: store.storage_root,
        origin: store.origin,
        base_url,
    });

    match command {
        Command::Provision {
            from_dir,
            project_base,
            quiet,
            ..
        } => {
            if let Some(project_base) = project_base {
                config.pipeline.project_base = project_base;
            }
            provision(&config, from_dir, quiet).await
        }
        Command::Manifest { dir, output } => manifest(dir, output),
        Command::Ls { path } => ls(&config, &path).await,
        Command::Cat { path } => cat(&config, &path).await,
    }
}

async fn provision(config: &CliConfig, from_dir: Option<PathBuf>, quiet: bool) -> Result<()> {
    let backend = config.backend().open().await?;
    let fetcher: Arc<dyn Fetcher> = match from_dir {
        Some(dir) => Arc::new(LocalFetcher::new(dir)),
        None => Arc::new(HttpFetcher::with_default_timeout()?),
    };
    let progress: Arc<dyn ProgressSink> = if quiet {
        Arc::new(NullProgress)
    } else {
        Arc::new(ConsoleProgress)
    };

    let mut pipeline = ProvisioningPipeline::new(config.pipeline.clone(), backend, fetcher)
        .with_progress(progress);
    let report = pipeline.run().await?;
    if !quiet {
        println!(
            "Provisioned {} files ({} bytes)",
            report.resources, report.bytes
        );
    }
    Ok(())
}

fn manifest(dir: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let manifest = ResourceManifest::scan_dir(&dir)?;
    let output = output.unwrap_or_else(|| dir.join(MANIFEST_FILE_NAME));

    if output.as_os_str() == "-" {
        println!("{}", manifest.to_json_pretty()?);
    } else {
        manifest.write_to(&output)?;
        tracing::info!(path = %output.display(), files = manifest.len(), "wrote manifest");
    }
    Ok(())
}

async fn ls(config: &CliConfig, path: &LogicalPath) -> Result<()> {
    let backend = config.backend().open().await?;
    let entries = backend.list_dir(path).await?;

    let mut out = std::io::stdout().lock();
    for entry in entries {
        if entry.is_dir() {
            writeln!(out, "{}/", entry.name)?;
        } else {
            writeln!(out, "{}", entry.name)?;
        }
    }
    Ok(())
}

async fn cat(config: &CliConfig, path: &LogicalPath) -> Result<()> {
    let backend = config.backend().open().await?;
    let contents = backend.read_binary(path).await?;

    let mut out = std::io::stdout().lock();
    out.write_all(&contents)?;
    out.flush()?;
    Ok(())
}
