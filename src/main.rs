use newsbrief::configuration::get_configuration;
use newsbrief::startup::Application;
use newsbrief::telemetry::get_subscriber;
use newsbrief::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server. No background
/// workers: everything happens within the handling of a request.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("newsbrief", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration().expect("could not load configuration");
    Application::build(cfg).await?.run_until_stopped().await?;
    Ok(())
}
