use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use log::info;
use tindify::{
    clients::{errors::Result, require_credential, token_store::EnvTokenStore},
    config::{ApiConfig, ConfigBuilder},
    server,
};

const ACCESS_TOKEN_VAR: &str = "SPOTIFY_ACCESS_TOKEN";

#[derive(Parser)]
#[command(name = "tindify")]
#[command(version, about = "Swipe through Spotify recommendations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API for the browser UI
    Serve {
        #[arg(long, env = "TINDIFY_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
        /// Drop the Secure flag from auth cookies (plain http on localhost)
        #[arg(long)]
        insecure_cookies: bool,
    },
    /// List the genres Spotify accepts as recommendation seeds
    Genres,
    /// Print one recommended track
    Recommend {
        #[arg(long)]
        seed_track: Option<String>,
        #[arg(long, value_delimiter = ',')]
        seed_genres: Vec<String>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            insecure_cookies,
        } => {
            info!("Building config ...");
            let config = ConfigBuilder::new()
                .secure_cookies(!insecure_cookies)
                .build()?;
            server::serve(&config, bind).await
        }
        Commands::Genres => list_genres().await,
        Commands::Recommend {
            seed_track,
            seed_genres,
        } => recommend(seed_track.as_deref(), &seed_genres).await,
    }
}

async fn list_genres() -> Result<()> {
    // Token first so a missing one fails before any request
    let credential = require_credential(&EnvTokenStore::new(ACCESS_TOKEN_VAR))?;
    let spotify = ApiConfig::from_env()?.client()?;
    for genre in spotify.get_available_genres(&credential).await? {
        println!("{genre}");
    }
    Ok(())
}

async fn recommend(seed_track: Option<&str>, seed_genres: &[String]) -> Result<()> {
    let credential = require_credential(&EnvTokenStore::new(ACCESS_TOKEN_VAR))?;
    let spotify = ApiConfig::from_env()?.client()?;
    let track = spotify
        .get_recommendation(&credential, seed_track, seed_genres)
        .await?;
    println!("{} - {} ({})", track.name, track.artist_names(), track.uri);
    if let Some(preview) = &track.preview_url {
        println!("preview: {preview}");
    }
    Ok(())
}
