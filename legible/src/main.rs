use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legible::api::v1::dto::OcrResponse;
use legible::api::{create_router, AppState};
use legible::config::Config;
use legible::ocr::RecognizerSet;

#[derive(Parser)]
#[command(name = "legible")]
#[command(about = "Photo preprocessing and multi-engine OCR service")]
struct Args {
    /// Extract text from this image and print the JSON result instead of serving HTTP
    #[arg(long, value_name = "FILE")]
    extract: Option<PathBuf>,

    /// With --extract: use OCR.Space instead of the local engines
    #[arg(long, requires = "extract")]
    cloud: bool,

    /// With --extract --cloud: OCR.Space language code (e.g. spa, eng)
    #[arg(long, value_name = "CODE", requires = "cloud")]
    language: Option<String>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "legible=info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // Logs go to stderr so `--extract` output on stdout stays machine-readable.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();

    tracing::info!(
        model_dir = %config.ocr.neural_model_dir.display(),
        languages = %config.ocr.languages,
        "Loading OCR engines..."
    );
    let engines = RecognizerSet::load(&config).await;
    let availability = engines.availability();
    if !availability.neural && !availability.classical {
        tracing::warn!("No local OCR engine available - /ocr will report no text");
    }
    if !availability.cloud {
        tracing::warn!("OCR_SPACE_API_KEY is not set - cloud OCR is disabled");
    }

    let state = AppState::new(config.clone(), engines);

    if let Some(path) = args.extract {
        return run_extract(&state, &path, args.cloud, args.language.as_deref()).await;
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Legible starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn run_extract(
    state: &AppState,
    path: &Path,
    cloud: bool,
    language: Option<&str>,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mime = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string());

    let response = if cloud {
        let result = state
            .extraction
            .extract_cloud(bytes, mime.as_deref(), language)
            .await?;
        OcrResponse::from_cloud(result, mime.unwrap_or_default())
    } else {
        OcrResponse::from(state.extraction.extract(bytes, mime.as_deref()).await?)
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests...");
}
