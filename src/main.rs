use clap::{Parser, Subcommand};
use simple_photo_server::config::{self, Overrides, ServerConfig};
use simple_photo_server::imaging::RustBackend;
use simple_photo_server::library::{LibraryConfig, PhotoLibrary};
use simple_photo_server::output;
use simple_photo_server::server::{Handler, Server};
use std::path::PathBuf;
use std::sync::Arc;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-photo-server")]
#[command(about = "Browse photo directories from any browser on the network")]
#[command(long_about = "\
Browse photo directories from any browser on the network

Each root directory is shown as a tree. Opening a directory shows its photos
as a paginated thumbnail grid, newest first; opening a photo shows it upright
(EXIF orientation applied) with previous/next navigation and a download link.

Thumbnails are generated on demand and kept in a bounded in-memory cache.
Pre-rendered thumbnails in a .thumbnails/ directory next to the photos are
used when present. Hidden directories are never listed.

Settings come from photo-server.toml in the working directory (or --config),
overridden by --root, --port and --bind.

Run 'simple-photo-server gen-config' to generate a documented config file.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: photo-server.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory to serve; repeat for several roots (replaces `roots` from the config)
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Listen port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Listen address
    #[arg(long, global = true)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Validate the configuration and list what would be served
    Check,
    /// Print a stock photo-server.toml with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            roots: self.roots.clone(),
            port: self.port,
            bind: self.bind.clone(),
        }
    }

    fn load_config(&self) -> Result<ServerConfig, config::ConfigError> {
        let working_dir = std::env::current_dir()?;
        config::load_config(self.config.as_deref(), &working_dir)?.with_overrides(&self.overrides())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let config = cli.load_config()?;
            let library = Arc::new(PhotoLibrary::new(
                LibraryConfig::from_server_config(&config),
                RustBackend::new(),
            ));
            for root in library.roots() {
                if !root.is_dir() {
                    log::warn!("Root {} is not a directory", root.display());
                }
            }
            let handler = Handler::new(Arc::clone(&library), config.gallery.columns);
            let server = Server::bind(config.listen_address(), handler)?;
            output::print_startup_banner(server.local_addr()?, library.roots());
            server.run()?;
        }
        Command::Check => {
            let config = cli.load_config()?;
            let library = PhotoLibrary::new(
                LibraryConfig::from_server_config(&config),
                RustBackend::new(),
            );
            println!("==> Checking {} roots", library.roots().len());
            let summaries: Vec<_> = library
                .roots()
                .iter()
                .map(|root| output::summarize_root(library.registry(), root))
                .collect();
            output::print_check_output(&summaries, &config);
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
