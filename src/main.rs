mod app;
mod config;
mod engine;
mod library;
mod mpris;
mod prefs;
mod queue;
mod runtime;
mod timefmt;
mod transport;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
