//! Connectivity check for an `ESPEasy` unit.
//!
//! Connects over HTTP, prints the unit's system info and task table,
//! and optionally exercises a GPIO pin with a double toggle.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use espeasy::{Esp, HttpConfig};
use tracing_subscriber::EnvFilter;

/// Check an `ESPEasy` unit over HTTP.
#[derive(Parser, Debug)]
#[command(name = "espcheck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address or hostname of the unit.
    #[arg(long)]
    ip: String,

    /// HTTP port of the unit's web server.
    #[arg(long, default_value_t = 80)]
    port: u16,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Exercise this GPIO pin: read, toggle twice, verify the level.
    #[arg(long)]
    gpio: Option<u8>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("espeasy=info,espcheck=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let config = HttpConfig::new(args.ip.clone())
        .port(args.port)
        .timeout(Duration::from_secs(args.timeout));
    let esp = Esp::with_http_config(config)?;

    let info = esp
        .connect()
        .await
        .with_context(|| format!("could not reach {}", esp.endpoint()))?;

    println!(
        "Unit:    {}",
        info.unit_name.as_deref().unwrap_or("<unnamed>")
    );
    if let Some(number) = info.unit_number {
        println!("Number:  {number}");
    }
    if let Some(build) = info.git_build.as_deref() {
        println!("Build:   {build}");
    }
    if let Some(uptime) = info.uptime {
        println!("Uptime:  {uptime} min");
    }

    let tasks = esp.tasks().await;
    if tasks.is_empty() {
        println!("\nNo tasks configured.");
    } else {
        println!("\nTasks:");
        for task in &tasks {
            let enabled = if task.enabled { "" } else { " (disabled)" };
            let task_type = task.task_type.as_deref().unwrap_or("?");
            println!("  {} [{task_type}]{enabled}", task.name);
            for value in &task.values {
                println!(
                    "    {:<12} {:.*}",
                    value.name,
                    usize::from(value.decimals),
                    value.value
                );
            }
        }
    }

    if let Some(pin) = args.gpio {
        exercise_gpio(&esp, pin).await?;
    }

    Ok(())
}

/// Reads a pin, toggles it twice, and checks the level came back.
async fn exercise_gpio(esp: &Esp, pin: u8) -> Result<()> {
    let before = esp.gpio_state(pin).await?;
    println!("\nGPIO {pin} is {before:?}");

    esp.gpio_toggle(pin).await?;
    esp.gpio_toggle(pin).await?;

    let after = esp.gpio_state(pin).await?;
    anyhow::ensure!(
        after == before,
        "GPIO {pin} ended at {after:?}, expected {before:?}"
    );
    println!("GPIO {pin} toggled twice and returned to {after:?}");
    Ok(())
}
