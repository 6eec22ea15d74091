//! `gesturecall serve`: the standalone web page.

use std::error::Error;

use tracing::info;

use gesturecall_channel_web::{WebConfig, WebServer};
use gesturecall_config::Config;

use crate::adapters;

pub(crate) fn web_config(config: &Config, host: Option<String>, port: Option<u16>) -> WebConfig {
    WebConfig {
        host: host.unwrap_or_else(|| config.server.host.clone()),
        port: port.unwrap_or(config.server.port),
        frame_interval_ms: config.detection.interval_ms,
        width: config.camera.web_width,
        height: config.camera.web_height,
    }
}

pub(crate) async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<(), Box<dyn Error>> {
    info!("Starting GestureCall web page v{}", env!("CARGO_PKG_VERSION"));

    let server = WebServer::new(
        web_config(config, host, port),
        adapters::tracker_factory(config),
        adapters::tracker_options(config),
    );
    let addr = server.start().await?;

    info!("Open http://{} in a browser", addr);
    info!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Stopping server...");
    server.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_config_overrides() {
        let config = Config::default();
        let web = web_config(&config, None, Some(9001));
        assert_eq!(web.host, "127.0.0.1");
        assert_eq!(web.port, 9001);
        assert_eq!((web.width, web.height), (1280, 720));
        assert_eq!(web.frame_interval_ms, 500);
    }
}
