pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tenant-rest")]
#[command(about = "Multi-tenant CRUD gateway for a JSON document collection")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP gateway (default)")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Mint a signed bearer token for a tenant")]
    Token(commands::token::TokenArgs),
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::handle(args).await,
        Some(Commands::Token(args)) => commands::token::handle(args),
        None => commands::serve::handle(commands::serve::ServeArgs::default()).await,
    }
}
