use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptfeed::config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().apply_args(std::env::args().skip(1));

    if let Err(e) = promptfeed::runner::run(&config).await {
        tracing::error!("run aborted: {e}");
        std::process::exit(1);
    }
}
