use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser, Debug)]
#[command(name = "qvault", version, about, long_about = None)]
struct Cli {
    /// DuckDB file holding the encrypted records (overrides the config file)
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(long, value_name = "PATH", global = true, env = "QVAULT_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file and store it under its file name
    Encrypt {
        /// File to encrypt
        file: PathBuf,
        #[arg(short, long, env = "QVAULT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Also write the ciphertext next to the input as `<FILE>.enc`
        #[arg(long)]
        write_sibling: bool,
    },
    /// Decrypt the first record stored under a file name
    Decrypt {
        /// Name the file was stored under
        file_name: String,
        #[arg(short, long, env = "QVAULT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Write the plaintext here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q when set.
    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbosity.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cmd::run(cli)
}
