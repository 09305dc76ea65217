mod cli;
mod client;
mod config;
mod error;
mod pipeline;
mod server;
mod storage;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use pipeline::{ImageClassifier, TextClassifier};
use std::sync::Arc;
use storage::ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Pull { model } => {
            let store = ObjectStore::connect(config.bucket.clone()).await;
            let artifacts: Vec<&str> = match &model {
                Some(name) => vec![name.as_str()],
                None => pipeline::ALL_ARTIFACTS.to_vec(),
            };

            for artifact in artifacts {
                let path = store.sync_model(&config.models_dir, artifact).await?;
                println!("✓ Successfully pulled model: {}", artifact);
                println!("  Path: {:?}", path);
            }
        }

        Commands::Serve { device, port, host } => {
            let device = pipeline::parse_device(&device)?;
            let device_name = format!("{:?}", device);

            // All artifacts are fetched and all pipelines loaded before the
            // listener binds; no request can observe a half-started service.
            let store = ObjectStore::connect(config.bucket.clone()).await;
            let sentiment_dir = store
                .sync_model(&config.models_dir, pipeline::SENTIMENT_ARTIFACT)
                .await?;
            let disaster_dir = store
                .sync_model(&config.models_dir, pipeline::DISASTER_ARTIFACT)
                .await?;
            let pose_dir = store
                .sync_model(&config.models_dir, pipeline::POSE_ARTIFACT)
                .await?;

            let sentiment = TextClassifier::load(&sentiment_dir, device.clone())?;
            let disaster = TextClassifier::load(&disaster_dir, device.clone())?;
            let pose = ImageClassifier::load(&pose_dir, device)?;

            let state =
                server::AppState::new(Arc::new(sentiment), Arc::new(disaster), Arc::new(pose));

            println!("🚀 mlserve starting...");
            println!("   Device: {}", device_name);
            println!("   Listening on: http://{}:{}", host, port);
            println!("   Sentiment: POST http://{}:{}/api/v1/sentiment_analysis", host, port);
            println!("   Disaster:  POST http://{}:{}/api/v1/disaster_classifier", host, port);
            println!("   Pose:      POST http://{}:{}/api/v1/pose_classifier", host, port);

            server::serve(&host, port, state).await?;
        }

        Commands::Predict { api_url } => {
            let mut config = config;
            if let Some(api_url) = api_url {
                config.api_url = api_url;
            }
            client::run_form(&config).await?;
        }

        Commands::Upload { file, prefix, name } => {
            let store = ObjectStore::connect(config.bucket.clone()).await;
            let prefix = prefix.unwrap_or_else(|| config.image_prefix.clone());
            let url = store.upload_image(&file, &prefix, name.as_deref()).await?;
            println!("{}", url);
        }
    }

    Ok(())
}
