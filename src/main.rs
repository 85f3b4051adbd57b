use std::process::ExitCode;

use serde_json::json;

use pingd::endpoints::{Marker, Ping};
use pingd::log::Logger;
use pingd::{Config, Router, Server};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::default();

    // No degraded mode: without a log backend the process does not start.
    if let Err(e) = pingd::logging::init(config.log_format) {
        eprintln!("pingd: {e}");
        return ExitCode::FAILURE;
    }

    let logger = Logger::tracing();
    let code = match run(&config, &logger).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.error("fatal", [("Error", json!(format!("{e:#}")))]);
            ExitCode::FAILURE
        }
    };

    logger.sync();
    code
}

async fn run(config: &Config, logger: &Logger) -> anyhow::Result<()> {
    let app = Router::new(logger.clone())
        .route("/ping", Ping)
        .route("/test", Marker::new(&config.marker_path));

    let listening = Server::from_config(config).listen().await?;
    listening.serve(app).await?;
    Ok(())
}
