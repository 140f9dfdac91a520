use anyhow::Context;
use colored::Colorize;

use aid_server::{AidServer, ServerConfig};
use aid_types::CauseKind;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::CheckConfig(args) => cmd_check_config(args),
    }
}

fn load_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    if config.tokens.is_empty() {
        tracing::warn!("no tokens configured; every engagement call will be rejected");
    }

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(async move {
        let server = AidServer::bootstrap(config).await?;
        println!(
            "{} aid server on {}",
            "✓".green().bold(),
            server.config().bind_addr.to_string().bold()
        );
        server.serve().await?;
        Ok::<_, anyhow::Error>(())
    })
}

fn cmd_check_config(args: CheckConfigArgs) -> anyhow::Result<()> {
    let config = ServerConfig::load(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;
    for line in summarize(&config) {
        println!("{line}");
    }
    println!("{} {} is valid", "✓".green().bold(), args.path.display());
    Ok(())
}

fn summarize(config: &ServerConfig) -> Vec<String> {
    let admins = config.tokens.iter().filter(|t| t.admin).count();
    let offerings = config
        .causes
        .iter()
        .filter(|c| c.kind == CauseKind::Offer && c.max_participants.is_some())
        .count();

    let mut lines = vec![
        format!("  Bind: {}", config.bind_addr.to_string().cyan()),
        format!("  Lock timeout: {} ms", config.lock_timeout_ms),
        format!("  Tokens: {} ({} admin)", config.tokens.len(), admins),
        format!("  Causes: {} ({} offerings)", config.causes.len(), offerings),
    ];
    for cause in &config.causes {
        let capacity = cause
            .max_participants
            .map(|max| format!(" [{max} seats]"))
            .unwrap_or_default();
        lines.push(format!(
            "    {} {}{}",
            cause.kind.to_string().yellow(),
            cause.title,
            capacity.dimmed()
        ));
    }
    lines
}
