#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use class_schedule::{AppConfig, Planner, http_api, logging};

    let config = AppConfig::load()?;
    if let Err(e) = logging::init_logging(&config.log_level, config.log_dir.as_deref()) {
        eprintln!("Logging disabled: {e}");
    }
    let addr: SocketAddr = config.http_addr.parse()?;
    let planner = Planner::open(config.open_store()?);

    println!("class-schedule HTTP API listening on http://{addr}");
    http_api::serve(addr, planner).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
