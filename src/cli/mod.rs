pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "coracle")]
#[command(about = "A text-first web browsing engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a URL once and print the response details
    Fetch {
        /// URL to fetch
        url: String,

        /// HTTP method (GET, POST, HEAD, PUT, DELETE)
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request body, for POST and PUT
        #[arg(short, long)]
        data: Option<String>,

        /// File with newline-delimited `Key: Value` headers; `#` starts a comment
        #[arg(long)]
        headers_file: Option<std::path::PathBuf>,

        /// Return 3xx responses as-is instead of following them
        #[arg(long)]
        no_redirects: bool,
    },
    /// Fetch a URL and print the reader-mode article
    Read {
        /// URL to read
        url: String,
    },
    /// Run the local demo server until Ctrl-C
    Serve {
        /// Port to bind (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Interactive browsing session on stdin
    Browse {
        /// Print raw bodies instead of reader-mode articles
        #[arg(long)]
        raw: bool,
    },
}
