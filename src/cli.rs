use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "clipbox")]
#[command(about = "Queue-backed yt-dlp download server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server and download workers
    Server(ServerArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Maximum simultaneous downloads (overrides worker.concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_overrides() {
        let cli = Cli::parse_from([
            "clipbox",
            "server",
            "--address",
            "127.0.0.1:9000",
            "--concurrency",
            "4",
        ]);
        let Commands::Server(args) = cli.command;
        assert_eq!(args.address.unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(args.concurrency, Some(4));
    }

    #[test]
    fn test_parse_server_defaults() {
        let cli = Cli::parse_from(["clipbox", "server"]);
        let Commands::Server(args) = cli.command;
        assert!(args.address.is_none());
        assert!(args.concurrency.is_none());
    }
}
