use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollbook::{open_manager, render_reports, Config};

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: ROLLBOOK_DB_PATH (default: ./rollbook.redb)");
            eprintln!("Optional: ROLLBOOK_GRADE_THRESHOLDS (default: 90,75,60,40)");
            eprintln!("Optional: ROLLBOOK_PASS_PERCENTAGE (default: 40)");
            eprintln!("Optional: ROLLBOOK_ATTENDANCE_WARNING (default: 75)");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting rollbook");
    tracing::info!("Database path: {}", config.db_path.display());

    let manager = match open_manager(&config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Database error: {}", e);
            std::process::exit(1);
        }
    };

    let json = std::env::args().skip(1).any(|a| a == "--json");
    match render_reports(&manager, json) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            eprintln!("Report error: {}", e);
            std::process::exit(1);
        }
    }
}
