use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "aid",
    about = "Mutual-aid engagement service: likes, enrollments, moderation",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Validate a configuration file and print a summary
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Overrides `bind_addr` from the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["aid", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.config.is_none());
            assert!(args.bind.is_none());
        } else { panic!("wrong command"); }
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "aid", "serve", "--config", "aid.toml", "--bind", "0.0.0.0:9000", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("aid.toml")));
            assert_eq!(args.bind.unwrap().port(), 9000);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_check_config() {
        let cli = Cli::try_parse_from(["aid", "check-config", "aid.toml"]).unwrap();
        if let Command::CheckConfig(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("aid.toml"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn rejects_bad_bind_address() {
        assert!(Cli::try_parse_from(["aid", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn check_config_requires_path() {
        assert!(Cli::try_parse_from(["aid", "check-config"]).is_err());
    }
}
