use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mlserve")]
#[command(version, about = "Pretrained-model serving over a REST API", long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Download model artifacts from object storage into the local cache
	Pull {
		/// Artifact name (e.g., "tinybert-sentiment-analysis"); all models if omitted
		model: Option<String>,
	},

	/// Fetch artifacts, load all pipelines and start the HTTP API server
	Serve {
		/// Device to run on (e.g., "cpu" or "cuda:0")
		#[arg(long, default_value = "cpu")]
		device: String,

		/// Port to listen on
		#[arg(long, default_value = "8000")]
		port: u16,

		/// Host to bind to
		#[arg(long, default_value = "0.0.0.0")]
		host: String,
	},

	/// Interactive form client: pick a model, enter input, post to the API
	Predict {
		/// Base URL of a running mlserve API
		#[arg(long)]
		api_url: Option<String>,
	},

	/// Upload a local image to object storage and print a signed fetch URL
	Upload {
		/// Path of the image file to upload
		file: PathBuf,

		/// Remote folder prefix
		#[arg(long)]
		prefix: Option<String>,

		/// Remote object name (defaults to the file's base name)
		#[arg(long)]
		name: Option<String>,
	},
}
