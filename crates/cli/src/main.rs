mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Build pipeline for a bilingual portfolio and blog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Create site.toml and translation stubs in a site directory
    Init {
        /// Path to the site directory
        path: PathBuf,

        /// Author name used in page titles and keywords
        #[arg(long)]
        author: Option<String>,

        /// Public origin of the site, e.g. https://example.com
        #[arg(long)]
        base_url: Option<String>,

        /// Content API endpoint
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Validate site configuration and inputs
    Validate {
        /// Path to the site directory
        path: PathBuf,
    },

    /// Generate post pages and inject default-language content into the bundled output
    Build {
        /// Path to the site directory
        path: PathBuf,

        /// Exit with an error when any post page fails to generate
        #[arg(long)]
        strict: bool,
    },

    /// Download mapped post images into the public directory
    Images {
        /// Path to the site directory
        path: PathBuf,
    },

    /// Serve the built site locally with live reload
    Preview {
        /// Path to the site directory
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Init {
            path,
            author,
            base_url,
            api_url,
        } => commands::init::run(path, author, base_url, api_url).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Build { path, strict } => commands::build::run(path, strict).await,
        Command::Images { path } => commands::images::run(path).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "folio", &mut io::stdout());
            Ok(())
        }
    }
}
