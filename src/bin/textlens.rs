use clap::Parser;
use serde_json::json;
use std::process::ExitCode;
use textlens::client::{
    HttpUploader, Pacing, ProcessingState, ProgressObserver, SelectedImage, Session, TerminalView,
    UiState,
};
use textlens::config::ClientArgs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let args = ClientArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let session = Session::new();
    let view = TerminalView::new();
    let observer: &dyn ProgressObserver = if args.json { &() } else { &view };

    let image = SelectedImage::from_path(&args.file)?;
    if let Err(e) = session.select(image) {
        observer.on_update(&session.snapshot());
        if args.json {
            eprintln!("{}", json!({ "error": e.to_string() }));
        }
        return Ok(ExitCode::FAILURE);
    }

    if let Some(selected) = session.selected() {
        tracing::info!(
            "Selected {} ({}, {:.2} MB)",
            selected.file_name(),
            selected.mime_type(),
            selected.size_mb()
        );
    }

    let uploader = HttpUploader::new(&args.server);
    let pacing = if args.no_pacing {
        Pacing::none()
    } else {
        Pacing::default()
    };
    session.submit(&uploader, pacing, observer).await;

    let state = session.snapshot();
    if args.json {
        print_json(&state)?;
    }

    Ok(match state.ui() {
        UiState::Done(_) | UiState::NoText { .. } => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn print_json(state: &ProcessingState) -> anyhow::Result<()> {
    match state.ui() {
        UiState::Done(result) => println!("{}", serde_json::to_string_pretty(result)?),
        UiState::NoText { quick_stop } => println!(
            "{}",
            json!({ "noTextFound": true, "quickStop": quick_stop })
        ),
        _ => {
            let message = state.error().unwrap_or("Upload failed");
            eprintln!("{}", json!({ "error": message }));
        }
    }
    Ok(())
}
