use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use face_client::{FaceApiClient, FaceGate, FaceService};
use pipeline::{HttpImageFetcher, ImageFetcher};
use records::{EnhancedResult, ImageBuffer, load_candidates};
use resolver::CandidateImageResolver;
use server::{AppConfig, ReferenceImage, ReverseSearchOrchestrator, SearchResponse, build_pipeline};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// FaceFind - reverse image search with face matching
#[derive(Parser)]
#[command(name = "facefind")]
#[command(about = "Reverse image search that finds full-size images and scores face similarity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reverse search an image and enhance every hit
    Search {
        /// Publicly reachable image to search for
        #[arg(long, conflicts_with = "image_file", required_unless_present = "image_file")]
        image_url: Option<Url>,

        /// Local image to search for (needs an image store)
        #[arg(long)]
        image_file: Option<PathBuf>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enhance a saved batch of search results
    Enhance {
        /// Reference image, as a path or an http(s) URL
        #[arg(long)]
        reference: String,

        /// JSON file with the candidate records
        #[arg(long)]
        results: PathBuf,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find the best full-resolution image of a web page
    Resolve {
        #[arg(long)]
        page: String,
    },

    /// Check whether an image contains a face
    Detect {
        /// Image, as a path or an http(s) URL
        #[arg(long)]
        image: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Invalid FACEFIND_* configuration")?;

    match cli.command {
        Commands::Search {
            image_url,
            image_file,
            json,
        } => handle_search(&config, image_url, image_file, json).await?,
        Commands::Enhance {
            reference,
            results,
            json,
        } => handle_enhance(&config, &reference, results, json).await?,
        Commands::Resolve { page } => handle_resolve(&config, &page).await?,
        Commands::Detect { image } => handle_detect(&config, &image).await?,
    }

    Ok(())
}

/// Handle the 'search' command
async fn handle_search(
    config: &AppConfig,
    image_url: Option<Url>,
    image_file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let reference = match (image_url, image_file) {
        (Some(url), _) => ReferenceImage::Url(url),
        (None, Some(path)) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ReferenceImage::Upload {
                bytes: bytes.into(),
                content_type: None,
            }
        }
        (None, None) => return Err(anyhow!("Either --image-url or --image-file is required")),
    };

    let orchestrator =
        ReverseSearchOrchestrator::from_config(config).context("Failed to set up reverse search")?;

    let start = Instant::now();
    let response = orchestrator.search(reference).await.context("Reverse search failed")?;
    eprintln!("{} Search finished in {:.2?}", "✓".green(), start.elapsed());

    print_response(&response, json, config.pipeline.threshold)
}

/// Handle the 'enhance' command
async fn handle_enhance(
    config: &AppConfig,
    reference: &str,
    results: PathBuf,
    json: bool,
) -> Result<()> {
    let candidates = load_candidates(&results)
        .with_context(|| format!("Failed to load results from {}", results.display()))?;
    println!("Loaded {} candidates from {}", candidates.len(), results.display());

    let fetcher: Arc<dyn ImageFetcher> = Arc::new(HttpImageFetcher::new(config.image_timeout)?);
    let reference = load_image(reference, fetcher.as_ref()).await?;

    let face = face_service(config)?;
    let pipeline = build_pipeline(config, face.clone(), fetcher)?;
    let gate = FaceGate::new(face);

    let start = Instant::now();
    let has_face = gate.contains_face(&reference).await;
    let original_results = pipeline.enhance(candidates, &reference, has_face).await;
    eprintln!("{} Enhanced batch in {:.2?}", "✓".green(), start.elapsed());

    print_response(&SearchResponse { original_results }, json, config.pipeline.threshold)
}

/// Handle the 'resolve' command
async fn handle_resolve(config: &AppConfig, page: &str) -> Result<()> {
    let resolver = CandidateImageResolver::from_config(config.resolver.clone())?;
    let strategies = resolver
        .strategies()
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" -> ");
    println!("{}", format!("Resolving {} ({})", page, strategies).bold().blue());

    match resolver.resolve(page).await {
        Some(url) => println!("{} {}", "✓".green(), url),
        None => println!("{} No image found", "✗".red()),
    }
    Ok(())
}

/// Handle the 'detect' command
async fn handle_detect(config: &AppConfig, image: &str) -> Result<()> {
    let fetcher = HttpImageFetcher::new(config.image_timeout)?;
    let buffer = load_image(image, &fetcher).await?;
    let gate = FaceGate::new(face_service(config)?);

    if gate.contains_face(&buffer).await {
        println!("{} Face detected in {}", "✓".green(), image);
    } else {
        println!("{} No face detected in {}", "✗".red(), image);
    }
    Ok(())
}

fn face_service(config: &AppConfig) -> Result<Arc<dyn FaceService>> {
    let client = FaceApiClient::new(config.face_service()?)?;
    Ok(Arc::new(client))
}

/// Read an image from an http(s) URL or a local path.
async fn load_image(source: &str, fetcher: &dyn ImageFetcher) -> Result<ImageBuffer> {
    match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => fetcher
            .fetch_image(url.as_str())
            .await
            .with_context(|| format!("Failed to download {}", url)),
        _ => {
            let bytes = tokio::fs::read(source)
                .await
                .with_context(|| format!("Failed to read {}", source))?;
            Ok(ImageBuffer::new(bytes))
        }
    }
}

/// Helper function to print an enhanced batch
fn print_response(response: &SearchResponse, json: bool, threshold: f32) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    let results = &response.original_results;
    let similar = results.iter().filter(|r| r.is_similar).count();
    println!(
        "{}",
        format!("{} results, {} similar (threshold {})", results.len(), similar, threshold)
            .bold()
            .blue()
    );
    for (rank, result) in results.iter().enumerate() {
        print_result(rank + 1, result);
    }
    Ok(())
}

fn print_result(rank: usize, result: &EnhancedResult) {
    let score = format!("{:5.1}", result.similarity.value());
    let score = if result.is_similar {
        score.green().bold()
    } else {
        score.normal()
    };
    println!(
        "{}. [{}] {}",
        rank.to_string().green(),
        score,
        result.title.as_deref().unwrap_or(&result.link)
    );
    println!("   page:  {}", result.link);
    println!("   image: {}", result.high_res_image);
}
