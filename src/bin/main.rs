use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_browser::config::Config;

#[derive(Parser, Debug)]
#[command(name = "movie-browser-server")]
#[command(about = "Read-only movie catalog API", long_about = None)]
struct Args {
    /// YAML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding categories.json and titles.json.
    #[arg(short, long)]
    datadir: Option<String>,

    #[arg(short, long, env = "PORT")]
    port: Option<String>,

    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.debug {
        "movie_browser=debug,tower_http=debug"
    } else {
        "movie_browser=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match args.config {
        Some(ref path) => {
            info!("Using config file: {}", path);
            match Config::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => Config::default(),
    };
    if let Some(datadir) = args.datadir {
        config.catalog.datadir = datadir;
    }
    if let Some(port) = args.port {
        config.listen.port = port;
    }

    if let Err(e) = movie_browser::run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
