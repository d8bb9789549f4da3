mod app;
mod chrome;
mod clock;
mod config;
mod error;
mod fall;
mod flower;
mod palette;
mod render;

fn main() {
    env_logger::init();
    log::info!("Flower clock starting up");

    if let Err(e) = app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
