use anyhow::{anyhow, bail, Context};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

use rpi_sources::builder::{BuildOptions, Pipeline};
use rpi_sources::firmware::{self, UpstreamSources};
use rpi_sources::models::{ArchSuffix, ConfigSource, PrepMode};

/// Fetch and prepare Raspberry Pi kernel sources for out-of-tree module
/// builds.
#[derive(Parser, Debug)]
#[command(name = "rpi_sources", version, about)]
struct Cli {
    /// Firmware build identifier (a commit in the firmware snapshot
    /// repository; see --list-builds)
    #[arg(value_name = "BUILD", required_unless_present = "list_builds")]
    build: Option<String>,

    /// Destination root for usr/src and lib/modules trees
    #[arg(long, default_value = "/", value_name = "DIR")]
    dest: PathBuf,

    /// Working directory for downloaded archives
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Extra-version tag folded into release directory names
    #[arg(long, default_value = "", value_name = "TAG")]
    extra_version: String,

    /// Override CONFIG_LOCALVERSION in the acquired .config
    #[arg(long, value_name = "TAG")]
    local_version: Option<String>,

    /// Only process the release with this architecture label
    /// (v6, v7, v7l, v8 or 2712)
    #[arg(long, value_name = "LABEL")]
    only: Option<ArchSuffix>,

    /// How to acquire the kernel .config (module, proc or skip)
    #[arg(long, default_value = "module", value_name = "MODE")]
    config: ConfigSource,

    /// Distro-specific preparation mode (standard or raspios)
    #[arg(long, default_value = "standard", value_name = "MODE")]
    prep: PrepMode,

    /// Do not create lib/modules/<release>/build symlinks
    #[arg(long)]
    no_links: bool,

    /// List recent firmware builds and exit
    #[arg(long)]
    list_builds: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

const BUILD_LISTING_LENGTH: usize = 20;

fn default_workdir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("rpi-sources")
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let sources = UpstreamSources::default();

    if cli.list_builds {
        let client = firmware::fetch::http_client()?;
        let builds = firmware::list_recent_builds(&client, &sources, BUILD_LISTING_LENGTH)
            .await
            .context("failed to list firmware builds")?;
        for build in &builds {
            println!("{} {}", build.short_sha(), build.subject);
        }
        return Ok(());
    }

    let Some(build) = cli.build else {
        bail!("a firmware build identifier is required");
    };
    if build.trim().is_empty() {
        bail!("the firmware build identifier must not be empty");
    }

    let options = BuildOptions {
        dest: cli.dest,
        workdir: cli.workdir.unwrap_or_else(default_workdir),
        extra_version: cli.extra_version,
        local_version: cli.local_version,
        only: cli.only,
        config_source: cli.config,
        prep_mode: cli.prep,
        create_links: !cli.no_links,
    };

    let pipeline = Pipeline::with_sources(options, sources)?;
    pipeline
        .run(&build)
        .await
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("failed to prepare kernel sources for build {}", build))
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version exit cleanly; bad option values are
            // failures and must exit 1 with the usage hint shown.
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    rpi_sources::system::initialize_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}
