mod cli;

use anyhow::Result;
use chrono::Utc;
use cleankiro::chat::scanner::space_savings;
use cleankiro::chat::ConversationScanner;
use cleankiro::cleaner::{Cleaner, CleanupPlan, CleanupPlanner, DefaultCleaner, ExecuteOptions};
use cleankiro::config::Config;
use cleankiro::history::HistoryLogger;
use cleankiro::output::{write_json, ChatReport, ExecutionReport, PlanReport, ScanReport};
use cleankiro::scanner::{subdirectory_sizes, FileScanner, FsWalker, ScanProgress};
use cleankiro::utils::format_size;
use cleankiro::{locator, logging};
use cli::{Cli, Commands, ConfigActions, OutputArgs, OutputFormat};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init(cli.verbose);

    let result = match Config::load() {
        Ok(config) => run(cli, config),
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    match cli.command {
        Commands::Scan { output } => run_scan(&config, &output)?,
        Commands::Clean {
            dry_run,
            yes,
            keep_logs,
            keep_cache,
            keep_chats,
            keep_index,
            keep_recent,
            output,
        } => {
            let mut options = config.clean.plan_options();
            options.keep_logs |= keep_logs;
            options.keep_cache |= keep_cache;
            options.keep_chats |= keep_chats;
            options.keep_index |= keep_index;
            if let Some(days) = keep_recent {
                options.keep_recent_days = days;
            }
            return run_clean(&config, options, dry_run, yes, &output);
        }
        Commands::Chats {
            cleanable,
            age_days,
            size_bytes,
            output,
        } => run_chats(&config, cleanable, age_days, size_bytes, &output)?,
        Commands::Config { action } => run_config(action, config)?,
        Commands::History { limit } => run_history(limit)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn storage_roots(config: &Config) -> Vec<PathBuf> {
    if config.scan.storage_roots.is_empty() {
        locator::existing_roots()
    } else {
        config.scan.storage_root_paths()
    }
}

fn agent_root(config: &Config, roots: &[PathBuf]) -> Option<PathBuf> {
    match &config.scan.agent_root {
        Some(path) => Some(PathBuf::from(path)),
        None => locator::first_agent_root(roots),
    }
}

fn file_scanner(config: &Config) -> FileScanner {
    FileScanner::with_walker(FsWalker::with_excluded(&config.scan.excluded_paths))
}

fn run_scan(config: &Config, output: &OutputArgs) -> Result<()> {
    let start = Instant::now();
    let roots = storage_roots(config);
    if roots.is_empty() && output.format == OutputFormat::Human {
        println!("No Kiro storage directory found.");
        return Ok(());
    }

    let mut report_done = |p: &ScanProgress| {
        if p.is_complete && output.format == OutputFormat::Human {
            eprintln!(
                "Scanned {} files in {} directories",
                p.scanned_files, p.scanned_dirs
            );
        }
    };
    let scan = file_scanner(config).scan(&roots, Some(&mut report_done));
    let subdirs = roots.iter().flat_map(|r| subdirectory_sizes(r)).collect();
    let report = ScanReport::new(
        roots.clone(),
        &scan,
        subdirs,
        start.elapsed().as_millis() as u64,
    );

    match output.format {
        OutputFormat::Json => write_json(&report, output.out.as_deref())?,
        OutputFormat::Human => {
            for root in &report.roots {
                println!("Storage root: {}", root.display());
            }
            println!();

            for cat in &report.categories {
                println!(
                    "  {:<10} {:>8} files  {:>12}",
                    cat.name,
                    cat.item_count,
                    format_size(cat.size_bytes)
                );
            }
            println!();

            if !report.subdirectories.is_empty() {
                println!("Largest areas:");
                for sub in &report.subdirectories {
                    println!("  {:<24} {:>12}", sub.name, format_size(sub.size));
                }
                println!();
            }

            for rec in &report.recommendations {
                println!("* {}", rec);
            }
            if report.skipped_count > 0 {
                println!("Skipped {} unreadable entries", report.skipped_count);
            }

            println!(
                "Total: {} files, {} (in {}ms)",
                report.total_item_count,
                format_size(report.total_size_bytes),
                report.scan_duration_ms
            );
        }
    }

    Ok(())
}

fn print_plan(plan: &CleanupPlan) {
    println!("Cleanup plan:\n");
    for summary in plan.by_reason() {
        println!(
            "  {:<8} {:>8} files  {:>12}",
            summary.reason,
            summary.count,
            format_size(summary.size)
        );
    }
    println!("\nTotal: {} files, {}", plan.len(), format_size(plan.total_size));

    if !plan.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in plan.warnings.iter().take(10) {
            println!("  - {}", warning);
        }
        if plan.warnings.len() > 10 {
            println!("  ... and {} more", plan.warnings.len() - 10);
        }
    }

    if !plan.recommendations.is_empty() {
        println!();
        for rec in &plan.recommendations {
            println!("* {}", rec);
        }
    }
}

fn run_clean(
    config: &Config,
    options: cleankiro::cleaner::PlanOptions,
    dry_run: bool,
    yes: bool,
    output: &OutputArgs,
) -> Result<ExitCode> {
    let now = Utc::now();
    let roots = storage_roots(config);
    let scan = file_scanner(config).scan(&roots, None);

    let conversations = match agent_root(config, &roots) {
        Some(root) if !options.keep_chats => ConversationScanner::new(root).find_all(now),
        _ => Vec::new(),
    };

    let plan = CleanupPlanner::new().plan(&scan.entries, &conversations, &options, now);

    if output.format == OutputFormat::Human {
        print_plan(&plan);
    }

    if plan.is_empty() {
        if output.format == OutputFormat::Json {
            write_json(&PlanReport::new(&plan), output.out.as_deref())?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    if !dry_run && !yes && config.clean.confirm_before_clean {
        match output.format {
            OutputFormat::Json => write_json(&PlanReport::new(&plan), output.out.as_deref())?,
            OutputFormat::Human => println!("\nUse --yes to delete these files"),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let execute = ExecuteOptions {
        dry_run,
        log_history: config.clean.log_history,
    };
    let result = DefaultCleaner::new().execute(&plan, &execute);
    let report = ExecutionReport::new(&plan, &result);

    match output.format {
        OutputFormat::Json => write_json(&report, output.out.as_deref())?,
        OutputFormat::Human if result.dry_run => {
            println!("\n[DRY-RUN] Nothing was deleted");
        }
        OutputFormat::Human => {
            println!("\nResults:");
            println!("  Deleted: {} files", result.deleted_count);
            println!("  Already gone: {} files", result.skipped_count);
            println!("  Failed: {} files", result.failed_count());
            println!("  Freed: {}", format_size(result.bytes_freed));
            println!("  Duration: {:?}", result.duration);

            if !result.failed_items.is_empty() {
                println!("\nFailed items:");
                for item in &result.failed_items {
                    println!("  - {}: {}", item.path.display(), item.error);
                }
            }
        }
    }

    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn run_chats(
    config: &Config,
    cleanable: bool,
    age_days: Option<u32>,
    size_bytes: Option<u64>,
    output: &OutputArgs,
) -> Result<()> {
    let roots = storage_roots(config);
    let Some(root) = agent_root(config, &roots) else {
        report_missing_agent(output.format, &mut std::io::stdout())?;
        return Ok(());
    };

    let scanner = ConversationScanner::new(&root);
    let scan = scanner.scan_workspaces(None);
    let stats = scan.stats();
    let mut report = ChatReport::new(root, stats.clone(), scan.skipped.len());

    if cleanable {
        let age = age_days.unwrap_or(config.chats.max_age_days);
        let size = size_bytes.unwrap_or(config.chats.max_size_bytes);
        let found = scanner.find_cleanable(age, size, Utc::now());
        let savings = space_savings(&found, &stats);
        report = report.with_cleanable(found, savings);
    }

    match output.format {
        OutputFormat::Json => write_json(&report, output.out.as_deref())?,
        OutputFormat::Human => {
            println!("Agent storage: {}\n", report.agent_root.display());
            println!("Conversations: {}", stats.total_conversations);
            println!(
                "Messages: {} (human {}, bot {}, tool {})",
                stats.total_messages, stats.human_messages, stats.bot_messages, stats.tool_messages
            );
            println!(
                "Average per conversation: {:.1}",
                stats.avg_messages_per_conversation
            );
            println!("Size: {}", format_size(stats.total_size));
            if let Some(last) = stats.last_activity {
                println!("Last activity: {}", last.format("%Y-%m-%d %H:%M:%S"));
            }

            if !stats.workspace_breakdown.is_empty() {
                println!("\nWorkspaces:");
                for ws in &stats.workspace_breakdown {
                    println!(
                        "  {:<34} {:>5} chats {:>7} msgs {:>12}",
                        ws.workspace_id,
                        ws.conversation_count,
                        ws.total_messages,
                        format_size(ws.total_size)
                    );
                }
            }

            if let (Some(found), Some(savings)) = (&report.cleanable, &report.savings) {
                println!("\nCleanable transcripts: {}", found.len());
                for conv in found.iter().take(20) {
                    println!(
                        "  [{}] {} ({})",
                        conv.reason,
                        conv.path.display(),
                        format_size(conv.size)
                    );
                }
                if found.len() > 20 {
                    println!("  ... and {} more", found.len() - 20);
                }
                println!(
                    "Would free {} ({:.1}% of transcript storage)",
                    format_size(savings.bytes),
                    savings.percent_of_total
                );
            }

            if report.skipped_count > 0 {
                println!("\nSkipped {} unreadable transcripts", report.skipped_count);
            }
        }
    }

    Ok(())
}

/// JSON stdout stays empty; the notice goes to the log instead.
fn report_missing_agent(format: OutputFormat, out: &mut impl Write) -> std::io::Result<()> {
    match format {
        OutputFormat::Human => writeln!(out, "No Kiro agent storage found."),
        OutputFormat::Json => {
            tracing::warn!("no Kiro agent storage found");
            Ok(())
        }
    }
}

fn run_config(action: ConfigActions, mut config: Config) -> Result<()> {
    match action {
        ConfigActions::Show => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigActions::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("Set {} to {}", key, value);
        }
        ConfigActions::AddExclude { path } => {
            config.add_excluded_path(path.clone());
            config.save()?;
            println!("Added exclusion: {}", path);
        }
        ConfigActions::Path => {
            println!("{}", Config::config_path().display());
        }
    }

    Ok(())
}

fn run_history(limit: usize) -> Result<()> {
    let logger = HistoryLogger::new();
    let entries = logger.read_history(Some(limit))?;

    if entries.is_empty() {
        println!("No history found.");
        return Ok(());
    }

    println!("Last {} deletion(s):\n", entries.len());

    for entry in entries {
        println!(
            "{} {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            entry.path.display()
        );
        if let Some(size) = entry.size {
            println!("    Size: {}", format_size(size));
        }
    }

    Ok(())
}
