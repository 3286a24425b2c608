//! Interactive mode for the server.
//!
//! Prompts for the listen address before starting the server.

use climate_compass_dashboard::DashboardConfig;
use dialoguer::{Confirm, Input};

use crate::ServerOptions;

/// Prompts for a bind address and port, then starts the server.
///
/// The prompts default to [`ServerOptions::from_env`], so `BIND_ADDR` and
/// `PORT` still apply when the user just presses enter.
///
/// # Errors
///
/// Returns an `std::io::Result` error if a prompt fails or the server
/// fails to start.
#[allow(clippy::future_not_send)]
pub async fn run(config: DashboardConfig) -> std::io::Result<()> {
    println!("{} Server", config.title);
    println!();

    let Some(options) = prompt_options(ServerOptions::from_env())? else {
        println!("Cancelled.");
        return Ok(());
    };

    super::run_server(config, options).await
}

fn prompt_options(defaults: ServerOptions) -> std::io::Result<Option<ServerOptions>> {
    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr)
        .interact_text()
        .map_err(std::io::Error::other)?;

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(defaults.port)
        .interact_text()
        .map_err(std::io::Error::other)?;

    let start = Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .map_err(std::io::Error::other)?;

    Ok(start.then_some(ServerOptions { bind_addr, port }))
}
