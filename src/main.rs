//! artcheck command-line entrypoint.
//!
//! Usage: `artcheck <image>...`. Settings come from `ARTCHECK_*` environment
//! variables; results are printed to stdout as JSON, logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use mimalloc::MiMalloc;
use serde::Serialize;

use artcheck::config::Config;
use artcheck::decision::VerificationResult;
use artcheck::service::{ErrorKind, VerificationService, VerifyError};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Serialize)]
struct Report {
    image: String,
    #[serde(flatten)]
    result: VerificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ReportError>,
}

#[derive(Debug, Serialize)]
struct ReportError {
    kind: ErrorKind,
    detail: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let images: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if images.is_empty() {
        eprintln!("usage: artcheck <image>...");
        std::process::exit(2);
    }

    let config = Config::from_env()?;

    tracing::info!(
        reference_dir = %config.reference_dir.display(),
        model = ?config.model_path,
        images = images.len(),
        "artcheck starting"
    );

    let service = tokio::task::spawn_blocking(move || VerificationService::start(config))
        .await
        .context("startup task panicked")??;

    let mut reports = Vec::with_capacity(images.len());
    for path in images {
        reports.push(verify_file(&service, path).await);
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);

    service.shutdown().await;
    Ok(())
}

async fn verify_file(service: &VerificationService, path: PathBuf) -> Report {
    let name = display_name(&path);

    let decoded = tokio::task::spawn_blocking(move || image::open(&path)).await;
    let decoded = match decoded {
        Ok(Ok(decoded)) => decoded,
        Ok(Err(e)) => {
            tracing::warn!(image = %name, error = %e, "Could not decode image");
            return Report::failed(name, ErrorKind::Client, e.to_string());
        }
        Err(e) => return Report::failed(name, ErrorKind::Internal, e.to_string()),
    };

    match service.verify(decoded).await {
        Ok(result) => Report {
            image: name,
            result,
            error: None,
        },
        Err(e) => {
            tracing::warn!(image = %name, error = %e, kind = ?e.kind(), "Verification failed");
            Report::from_error(name, &e)
        }
    }
}

impl Report {
    fn from_error(image: String, err: &VerifyError) -> Self {
        Self {
            image,
            result: VerificationResult::operational_failure(err),
            error: Some(ReportError {
                kind: err.kind(),
                detail: err.to_string(),
            }),
        }
    }

    fn failed(image: String, kind: ErrorKind, detail: String) -> Self {
        Self {
            image,
            result: VerificationResult::unavailable("The image could not be read."),
            error: Some(ReportError { kind, detail }),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}
