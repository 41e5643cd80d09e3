mod config;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    orchestrator::SubmitOutcome,
    view_state::{PointPosition, ViewKind},
    EmbeddingListView, HttpVisualizationApi, InteractiveView, MissingTokenProvider,
    MissingVisualizationApi, PresetCatalog, PublishedResult, StaticTokenProvider, TokenProvider,
    ViewStateHub, VisualizationSession,
};
use shared::domain::{Algorithm, Dimension, PresetId};
use tracing::{error, info};

use crate::config::{load_settings, Settings};

#[derive(Parser, Debug)]
struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists the bundled sample sets.
    Presets,
    /// Renders a bundled preset's precomputed result without any request.
    Show {
        #[arg(long)]
        preset: String,
        #[arg(long, default_value = "pca", value_parser = parse_algorithm)]
        algorithm: Algorithm,
        #[arg(long, default_value = "2d", value_parser = parse_dimension)]
        dimension: Dimension,
        /// Index of the point to highlight, as if hovered.
        #[arg(long)]
        hover: Option<usize>,
    },
    /// Sends custom samples to the visualization endpoint.
    Visualize {
        #[arg(long = "text", required = true)]
        texts: Vec<String>,
        #[arg(long, default_value = "pca", value_parser = parse_algorithm)]
        algorithm: Algorithm,
        #[arg(long, default_value = "2d", value_parser = parse_dimension)]
        dimension: Dimension,
        /// Prints the raw response body instead of the rendered views.
        #[arg(long)]
        json: bool,
    },
    /// Checks that the visualization endpoint is reachable.
    Health,
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, String> {
    Algorithm::ALL
        .into_iter()
        .find(|algorithm| algorithm.as_str().eq_ignore_ascii_case(raw))
        .ok_or_else(|| format!("unknown algorithm '{raw}', expected pca, tsne or umap"))
}

fn parse_dimension(raw: &str) -> Result<Dimension, String> {
    match raw.to_ascii_lowercase().as_str() {
        "2d" => Ok(Dimension::TwoD),
        "3d" => Ok(Dimension::ThreeD),
        _ => Err(format!("unknown dimension '{raw}', expected 2d or 3d")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let catalog = Arc::new(PresetCatalog::bundled().context("failed to load bundled presets")?);

    match cli.command {
        Command::Presets => {
            for preset in catalog.iter() {
                println!(
                    "{:<28} {:<36} samples={} precomputed={}",
                    preset.id.as_str(),
                    preset.display_name,
                    preset.texts.len(),
                    preset.has_precomputed_result()
                );
            }
        }
        Command::Show {
            preset,
            algorithm,
            dimension,
            hover,
        } => {
            let mut session = VisualizationSession::new(
                catalog,
                Arc::new(MissingVisualizationApi),
                settings.edit_debounce(),
            );
            let preset_id = PresetId::new(preset);
            if !session.select_preset(&preset_id) {
                return Err(anyhow!("unknown preset '{preset_id}'"));
            }
            let snapshot = session.snapshot();
            let displayed = snapshot
                .displayed()
                .ok_or_else(|| anyhow!("preset '{preset_id}' has no precomputed result"))?;
            render(displayed, algorithm, dimension, hover);
        }
        Command::Visualize {
            texts,
            algorithm,
            dimension,
            json,
        } => {
            let api = Arc::new(http_api(&settings)?);
            let mut session = VisualizationSession::new(catalog, api, settings.edit_debounce());
            session.clear();
            for (index, text) in texts.iter().enumerate() {
                if index >= session.snapshot().samples.len() {
                    session.add_sample();
                }
                session.edit_sample(index, text.as_str());
            }
            let outcome = session.submit()?.await.context("visualization task panicked")?;
            match outcome {
                SubmitOutcome::Published(result_id) => {
                    let snapshot = session.snapshot();
                    let displayed = snapshot
                        .displayed()
                        .filter(|result| result.id == result_id)
                        .ok_or_else(|| anyhow!("published result is no longer displayed"))?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(displayed.response.as_ref())?);
                    } else {
                        render(displayed, algorithm, dimension, None);
                    }
                }
                SubmitOutcome::Failed(err) => {
                    if err.requires_reauth() {
                        error!(%err, "visualization rejected; set VISUALIZER_API_TOKEN and retry");
                    }
                    return Err(err.into());
                }
                SubmitOutcome::Superseded(seq) => {
                    return Err(anyhow!("request {} was superseded", seq.0));
                }
            }
        }
        Command::Health => {
            let api = http_api(&settings)?;
            let health = api.health().await?;
            println!("{} status={}", api.base_url(), health.status);
        }
    }

    Ok(())
}

fn http_api(settings: &Settings) -> Result<HttpVisualizationApi> {
    let tokens: Arc<dyn TokenProvider> = match &settings.api_token {
        Some(token) => Arc::new(StaticTokenProvider::new(token.clone())),
        None => Arc::new(MissingTokenProvider),
    };
    info!(base_url = %settings.api_base_url, "using visualization endpoint");
    HttpVisualizationApi::with_timeout(&settings.api_base_url, tokens, settings.request_timeout())
}

fn render(result: &PublishedResult, algorithm: Algorithm, dimension: Dimension, hover: Option<usize>) {
    let hub = ViewStateHub::new();
    let mut view = InteractiveView::new(hub.clone());
    hub.select_dimension(dimension);
    hub.select_algorithm(algorithm);

    let Some(batch) = view.batch_for(Some(result)) else {
        return;
    };
    hub.set_hover(hover);

    let kind = match dimension {
        Dimension::TwoD => ViewKind::Chart2d,
        Dimension::ThreeD => ViewKind::Scene3d,
    };
    println!("{} ({dimension})", algorithm.display_name());
    if let Some(description) = algorithm.description(dimension) {
        println!("{description}");
    }
    for point in hub.subscribe(kind).render(&batch) {
        let marker = if point.highlighted { '*' } else { ' ' };
        let position = match point.position {
            PointPosition::Planar(p) => format!("({:.3}, {:.3})", p.x, p.y),
            PointPosition::Spatial(p) => format!("({:.3}, {:.3}, {:.3})", p.x, p.y, p.z),
        };
        let label = if point.show_label { point.label.as_str() } else { "" };
        println!("{marker} {:>3} {position:<28} {label}", point.index);
    }

    let mut list = EmbeddingListView::new(&hub);
    println!();
    println!("Embeddings");
    for row in list.rows(result) {
        println!("  {:>3} {:<53} {} dims", row.index, row.label, row.dimensions);
    }
}
