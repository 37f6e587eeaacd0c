use invoice_form::config::Config;
use invoice_form::draft::Draft;
use invoice_form::render::export::{PdfFileSaver, PdfPreview};
use invoice_form::session::Session;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = ".config/invoice.toml";

/// Usage: `invoice_form <draft.toml> [config.toml]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let draft_path = args
        .next()
        .ok_or("usage: invoice_form <draft.toml> [config.toml]")?;
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let cfg = Config::load_or_default(&config_path)?;

    // init tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log.filter));
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .init();

    info!(config = %config_path, draft = %draft_path, "Starting invoice export");

    let draft = Draft::load(&draft_path)?;
    let mut session = Session::new(cfg.layout, cfg.output.file_name.clone());
    draft.apply(&mut session).await?;

    let doc = session.prepare()?;
    debug!(layout = %serde_json::to_string_pretty(doc)?, "Rendered layout");
    info!(readout = %serde_json::to_string(&session.readout())?, "Invoice ready");

    if cfg.output.preview {
        session.view(&PdfPreview::new(&cfg.output.preview_dir))?;
    }

    match session.download(&PdfFileSaver::new(&cfg.output.dir))? {
        Some(path) => info!(path = %path.display(), "Invoice written"),
        None => info!("Nothing to download"),
    }

    Ok(())
}
