// Entrypoint for the publisher.
// - Keeps `main` small: load config, build the API client and hand both
//   to the workflow.
// - Setup failures surface through `anyhow`; workflow failures go through
//   the single handler below.

use anyhow::Context;
use exchange_publish::api::ApiClient;
use exchange_publish::config::Config;
use exchange_publish::ui::TerminalPrompter;
use exchange_publish::workflow::Publisher;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with prompts.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    let api = ApiClient::new(config).context("Failed to build HTTP client")?;
    let maven_base = api.config().exchange_maven_api.base_uri.clone();
    let prompter = TerminalPrompter::new();
    let work_dir = std::env::current_dir().context("Failed to resolve working directory")?;

    match Publisher::new(&api, &prompter, maven_base, work_dir).run() {
        Ok(report) => {
            println!(
                "Published {}:{} ({} files)",
                report.coordinates.asset_id,
                report.coordinates.version,
                report.uploaded.len()
            );
            Ok(())
        }
        Err(e) => {
            debug!(error = ?e, "publish failed");
            println!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
