//! Collection bundling example
//!
//! This example demonstrates the core functionality of refbundle:
//! - Configuring the library connection from environment variables
//! - Creating a bundler instance
//! - Bundling a collection addressed by a `>`-separated path
//! - Printing the run summary

use refbundle::{BundleConfig, CollectionBundler, Config, LibraryConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Credentials come from the environment so they never land in code
    let library_id = std::env::var("LIBRARY_ID")?;
    let api_key = std::env::var("LIBRARY_API_KEY")?;
    let collection = std::env::var("COLLECTION_PATH")
        .unwrap_or_else(|_| "TICS > s3:sci-insights > s3.3:social".to_string());

    // Build configuration
    let config = Config {
        library: LibraryConfig {
            library_id,
            api_key,
            ..Default::default()
        },
        bundle: BundleConfig {
            output_dir: "downloads".into(),
            ..Default::default()
        },
        ..Default::default()
    };

    // Create bundler instance and run
    let bundler = CollectionBundler::new(config)?;
    let outcome = bundler.run(&collection).await?;

    println!("{}", outcome.summary.render());
    for chunk in &outcome.summary.chunks {
        println!("wrote {}", chunk.path.display());
    }

    Ok(())
}
