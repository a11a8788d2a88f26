//! Command-line interface, parsed with clap.

use clap::{Parser, Subcommand};

/// Catalog API - users and products over REST
#[derive(Parser)]
#[command(name = "catalog-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Populate the database with sample users and products
    Seed,

    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Write a default config.toml to the working directory
    #[command(alias = "init")]
    InitConfig,
}
