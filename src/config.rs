use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Command-line configuration for the dashboard server.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "market-dash",
    version,
    about = "Serve the SpaceTrader market data exploration dashboard"
)]
pub struct Cli {
    /// Marketplace CSV to load at startup
    #[arg(
        long,
        env = "MARKET_DASH_DATA",
        default_value = "spacebot_public_marketplace.csv"
    )]
    pub data: PathBuf,

    /// Address to bind
    #[arg(long, env = "MARKET_DASH_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to bind
    #[arg(long, env = "MARKET_DASH_PORT", default_value_t = 8080)]
    pub port: u16,
}

impl Cli {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_arguments() {
        let cli = Cli::try_parse_from([
            "market-dash",
            "--data",
            "/tmp/market.csv",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
        ])
        .unwrap();
        assert_eq!(cli.data, PathBuf::from("/tmp/market.csv"));
        assert_eq!(cli.socket_addr(), "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["market-dash", "--port", "http"]).is_err());
    }
}
