use std::path::PathBuf;

use clap::Parser;

use printdeck::{ExtensionRegistry, Server};

#[derive(Parser)]
#[command(name = "printdeck")]
#[command(about = "Web control panel for networked fabrication devices", long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host, overriding the configuration.
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overriding the configuration.
    #[arg(short, long)]
    port: Option<u16>,

    /// Force debug logging.
    #[arg(long)]
    debug: bool,

    /// Allow running with root privileges.
    #[arg(long)]
    allow_root: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Extension loading is handled by the deployment; the bare binary
    // starts with an empty registry.
    let server = Server::new(ExtensionRegistry::empty())
        .with_config_path(cli.config)
        .with_host(cli.host)
        .with_port(cli.port)
        .with_debug(cli.debug)
        .with_allow_root(cli.allow_root);

    if let Err(e) = server.run().await {
        eprintln!("printdeck failed: {e}");
        std::process::exit(1);
    }
}
