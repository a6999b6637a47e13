use enhance_service::config::EnhanceConfig;
use enhance_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EnhanceConfig::load()?;

    init_tracing(
        "enhance-service",
        "info,enhance_service=debug",
        config.otlp_endpoint.as_deref(),
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        e
    })?;

    application.run_until_stopped().await?;

    Ok(())
}
