use clap::Parser;
use kegg_mapper::utils::error::ErrorSeverity;
use kegg_mapper::utils::{logger, validation::Validate};
use kegg_mapper::{
    CliConfig, ColorMapper, LocalStorage, MapperError, ReqwestBrowser, ServiceConfig,
};

fn load_service_config(config: &CliConfig) -> kegg_mapper::Result<ServiceConfig> {
    let service = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading service configuration from: {}", path);
            ServiceConfig::from_file(path)?
        }
        None => ServiceConfig::default(),
    };
    let service = service.with_base_url(config.base_url.clone());
    service.validate()?;
    Ok(service)
}

fn report_failure(e: &MapperError) -> i32 {
    tracing::error!(
        "❌ Pathway retrieval failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("🚀 Starting kegg-mapper");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let service = match load_service_config(&config) {
        Ok(service) => service,
        Err(e) => std::process::exit(report_failure(&e)),
    };

    let browser = match ReqwestBrowser::new(service.user_agent(), service.timeout()) {
        Ok(browser) => browser,
        Err(e) => std::process::exit(report_failure(&e)),
    };

    let mut mapper = ColorMapper::new(browser, LocalStorage::default(), service);

    match mapper.run(&config.to_request()).await {
        Ok(outcome) => {
            let program = std::env::args()
                .next()
                .unwrap_or_else(|| "kegg-mapper".to_string());
            println!("{}", outcome.stdout_message(&program));
        }
        Err(e) => {
            let exit_code = report_failure(&e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
