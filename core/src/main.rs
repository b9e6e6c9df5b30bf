/// navsim - drives the UI controllers from a command script
use messenger_ui_core::cli_app::{demo_engine, print_usage, Simulator};
use messenger_ui_core::engine::{EngineFixture, InMemoryEngine};
use messenger_ui_core::UiConfig;
use std::env;
use std::io::Read;
use std::rc::Rc;
use tokio::task::LocalSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage(args.first().map(String::as_str).unwrap_or("navsim"));
        return Ok(());
    }
    let config = UiConfig::from_args(&args)?;

    let engine = match &config.fixture {
        Some(path) => InMemoryEngine::from_fixture(
            EngineFixture::from_file(path)
                .map_err(|e| anyhow::anyhow!("Fixture error ({}): {}", path.display(), e))?,
        ),
        None => demo_engine(),
    };

    // Read the whole script up front so stdin is never polled from the UI loop
    let script = match &config.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    info!("Starting navigation simulator ({:?})", config.layout);
    let local = Rc::new(LocalSet::new());
    let executor = local.clone();
    let failures = local
        .run_until(async move {
            let simulator = Simulator::new(config, Rc::new(engine), executor, false)?;
            let failures = simulator.run_script(&script).await;
            simulator.shutdown();
            Ok::<usize, anyhow::Error>(failures)
        })
        .await?;

    if failures > 0 {
        warn!("{} command(s) failed", failures);
    }
    Ok(())
}
