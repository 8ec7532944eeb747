use clap::{Arg, Command};
use log::LevelFilter;
use std::process;
use std::sync::Arc;

use phishguard::api;
use phishguard::Config;
use phishguard::Scanner;

#[tokio::main]
async fn main() {
    let matches = Command::new("phishguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("URL phishing scanner combining a statistical model with heuristic signals")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/phishguard.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity and print a summary")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("scan")
                .long("scan")
                .value_name("URL")
                .help("Scan a single URL and print the verdict")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("history")
                .long("history")
                .value_name("N")
                .help("Print the N most recent scan verdicts")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("listen")
                .long("listen")
                .value_name("ADDR")
                .help("Override the configured listen address"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-probe detail")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if let Some(listen) = matches.get_one::<String>("listen") {
        config.listen_addr = listen.clone();
    }

    if matches.get_flag("test-config") {
        print_config_summary(&config);
        return;
    }

    let scanner = match Scanner::from_config(&config) {
        Ok(scanner) => Arc::new(scanner),
        Err(e) => {
            eprintln!("Error initializing scanner: {e}");
            process::exit(1);
        }
    };

    if let Some(url) = matches.get_one::<String>("scan") {
        scan_one(&scanner, url).await;
        return;
    }

    if let Some(limit) = matches.get_one::<String>("history") {
        let limit: u32 = limit.parse().unwrap_or(50);
        print_history(&scanner, limit);
        return;
    }

    serve(scanner, &config.listen_addr).await;
}

async fn serve(scanner: Arc<Scanner>, listen_addr: &str) {
    let app = api::router(scanner);

    let listener = match tokio::net::TcpListener::bind(listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error binding {listen_addr}: {e}");
            process::exit(1);
        }
    };

    log::info!("phishguard API listening on http://{listen_addr}");
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {e}");
        process::exit(1);
    }
}

async fn scan_one(scanner: &Scanner, url: &str) {
    println!("🔍 Scanning URL: {url}");
    println!();

    match scanner.scan(url).await {
        Ok(report) => {
            match report.prediction {
                phishguard::Label::Legitimate => println!("✅ Result: LEGITIMATE"),
                phishguard::Label::Suspicious => println!("⚠️  Result: SUSPICIOUS"),
                phishguard::Label::Phishing => println!("❌ Result: PHISHING"),
            }
            println!("   Confidence: {:.4}", report.confidence);
            println!("   Risk score: {}/100", report.risk_score);
            if !report.reasons.is_empty() {
                println!("   Reasons:");
                for reason in &report.reasons {
                    println!("     - {reason}");
                }
            }
        }
        Err(e) => {
            eprintln!("❌ Scan failed: {e}");
            process::exit(1);
        }
    }
}

fn print_history(scanner: &Scanner, limit: u32) {
    match scanner.history(limit) {
        Ok(entries) => {
            if entries.is_empty() {
                println!("No scans recorded yet.");
                return;
            }
            println!("Last {} scans:", entries.len());
            for entry in entries {
                println!(
                    "  #{} [{}] {} -> {} (risk {})",
                    entry.id, entry.timestamp, entry.url, entry.prediction, entry.risk_score
                );
            }
        }
        Err(e) => {
            eprintln!("Error reading scan history: {e}");
            process::exit(1);
        }
    }
}

fn print_config_summary(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();
    println!("✅ Configuration is valid");
    println!("   Listen address: {}", config.listen_addr);
    println!("   Scan ledger: {}", config.database_path);
    println!(
        "   Model weights: {}",
        config.model_path.as_deref().unwrap_or("(built-in)")
    );
    println!(
        "   Probe timeout: {}s, WHOIS timeout: {}s",
        config.probe_timeout_seconds(),
        config.whois_timeout_seconds()
    );
    println!(
        "   Heuristics: {} shorteners, {} keywords, {} suspicious TLDs, {} trusted brands",
        config.heuristics.shorteners.len(),
        config.heuristics.suspicious_keywords.len(),
        config.heuristics.suspicious_tlds.len(),
        config.heuristics.trusted_brands.len()
    );
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}
