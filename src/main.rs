use clap::Parser;
use roster_etl::core::TransformResult;
use roster_etl::utils::{logger, validation::Validate};
use roster_etl::{CliConfig, CustomerPipeline, EtlEngine, EtlError, LocalStorage, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入配置 (TOML 檔 + 命令列覆蓋)
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if cli.log_json || config.json_logs() {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting roster-etl ({})", config.job.name);
    tracing::debug!("Resolved config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, cli.dry_run);

    let monitor_enabled = cli.monitor_enabled(&config);
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = CustomerPipeline::new(LocalStorage::default(), config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no files will be written");
        match engine.plan().await {
            Ok(result) => print_plan(&result, engine.pipeline().config().output.path.as_str()),
            Err(e) => fail(e),
        }
        return Ok(());
    }

    match engine.run().await {
        Ok(written) => {
            println!("Arquivos gerados ({}):", written.len());
            for path in &written {
                println!("  📁 {}", path);
            }
            if !written.is_empty() {
                println!();
                println!("✅ Pronto! Rode cada arquivo na ordem listada acima.");
            }
        }
        Err(e) => fail(e),
    }

    Ok(())
}

fn fail(e: EtlError) -> ! {
    tracing::error!(
        "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code());
}

fn display_config_summary(config: &TomlConfig, dry_run: bool) {
    println!("📋 Configuration Summary:");
    println!("  Job: {}", config.job.name);
    if let Some(description) = &config.job.description {
        println!("  Description: {}", description);
    }
    println!("  Primary: {}", config.sources.primary.path);
    println!("  Secondary: {}", config.sources.secondary.path);
    println!(
        "  Output: {} ({} files, table {})",
        config.output.path, config.output.batches, config.output.table
    );
    let retained: Vec<String> = config
        .roster
        .entries()
        .iter()
        .filter(|e| e.retain)
        .map(|e| format!("{} -> {}", e.full_name, e.display_name()))
        .collect();
    println!("  Roster: {}", retained.join(", "));
    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}

fn print_plan(result: &TransformResult, output_path: &str) {
    let stats = &result.stats;
    println!("🔍 Dry Run Analysis:");
    println!("  Total customers: {}", result.customers.len());
    println!(
        "  From primary: {} (skipped: {} other professionals, {} invalid phones, {} repeated)",
        stats.created_from_primary,
        stats.primary_not_retained,
        stats.primary_invalid_phone,
        stats.primary_duplicates
    );
    println!(
        "  Secondary only: {} (skipped: {} invalid phones, {} unusable names)",
        stats.created_from_secondary, stats.secondary_invalid_phone, stats.secondary_unusable_name
    );
    println!();
    println!("💾 Files that would be written to {}:", output_path);
    for batch in &result.batches {
        println!(
            "  {} (clientes {} a {} de {})",
            batch.file_name, batch.first_record, batch.last_record, batch.total_records
        );
    }
}
