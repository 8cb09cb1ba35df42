use anyhow::Result;

use crate::backend::Backend;
use crate::booking::{format_duration, Booking};
use crate::config::{config, CrewdeskConfig};
use crate::directory::BookingDirectory;

pub mod availability;
pub mod history;
pub mod init;
pub mod jobs;
pub mod seed;
pub mod summary;
pub mod work;

/// Loaded configuration plus the backend it points at
pub struct AppContext {
    pub config: CrewdeskConfig,
    pub backend: Backend,
    pub directory: BookingDirectory,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let config = config()?.clone();
        Self::from_config(config)
    }

    pub fn from_config(config: CrewdeskConfig) -> Result<Self> {
        let backend = Backend::from_config(&config.backend)?;
        let directory = BookingDirectory::from_config(backend.clone(), &config.backend);
        Ok(Self {
            config,
            backend,
            directory,
        })
    }
}

pub async fn with_context<F, Fut, R>(f: F) -> Result<R>
where
    F: FnOnce(AppContext) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    match AppContext::load() {
        Ok(context) => f(context).await,
        Err(e) => {
            println!("❌ Could not set up the backend: {e:#}");
            println!("   💡 Run 'crewdesk init' and fill in [backend] in crewdesk.toml");
            Err(e)
        }
    }
}

pub fn print_booking_row(booking: &Booking) {
    println!(
        "  📋 {} | {} | {}",
        booking.id,
        booking.display_name(),
        booking.booking_time.as_deref().unwrap_or("no time set")
    );
    if let Some(address) = booking.full_address.as_deref().filter(|a| !a.trim().is_empty()) {
        println!("     📍 {address}");
    }
}

pub fn print_history_row(booking: &Booking) {
    let ended = booking
        .work_ended_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let worked = format_duration(booking.worked_duration_seconds.unwrap_or(0));
    println!("  ✅ {} | {} | ended {} | worked {}", booking.id, booking.display_name(), ended, worked);
}

pub async fn show_how_to_get_work() -> Result<()> {
    println!("🧰 crewdesk - on-site job companion");
    println!();
    println!("Daily commands:");
    println!("  📋 crewdesk jobs           # Jobs assigned to you");
    println!("  🆕 crewdesk new            # Jobs you have not opened yet");
    println!("  🛠️  crewdesk work <id>      # Run a visit: codes, photos, timer");
    println!("  📚 crewdesk history        # Completed jobs");
    println!("  📊 crewdesk summary        # Badge counters");
    println!();
    println!("Setup:");
    println!("  ⚙️  crewdesk init           # Write crewdesk.toml");
    println!();
    println!("💡 Start with 'crewdesk jobs' to see what is on today.");
    Ok(())
}
