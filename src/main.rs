use anyhow::{Context, Result};
use cli::Cli;
use config::Configuration;
use pipeline::{RunOptions, RunReport};
use sinks::PdfRenderer;
use std::process::ExitCode;
use summary::{AnthropicClient, SummaryService};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod config;
mod discovery;
mod error;
mod estimate;
mod ignore_list;
mod pipeline;
mod selection;
mod sinks;
mod summary;

fn main() -> ExitCode {
    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let mut config = Configuration::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    config.apply(&cli.overrides());

    if cli.show_config {
        let mut shown = config.clone();
        if shown.ai.api_key.is_some() {
            shown.ai.api_key = Some("<redacted>".to_string());
        }
        let toml = toml::to_string_pretty(&shown).with_context(|| "Failed to format configuration")?;
        println!("{toml}");
        return Ok(());
    }

    config.validate()?;

    let service = if config.ai.enabled {
        match AnthropicClient::from_config(&config.ai) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("{e}; using rule-based summary");
                None
            }
        }
    } else {
        None
    };

    println!("Scanning {}...", config.code_folder.display());
    let renderer = PdfRenderer::new(&config).with_context(|| "Failed to set up PDF rendering")?;
    let options = RunOptions {
        no_ignore: cli.no_ignore,
        progress: true,
    };
    let report = pipeline::run(
        &config,
        &options,
        &renderer,
        service.as_ref().map(|s| s as &dyn SummaryService),
    )
    .with_context(|| "Failed to generate listing")?;

    print_report(&config, &report);
    Ok(())
}

fn setup_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("src_pages=warn"),
        1 => EnvFilter::new("src_pages=info"),
        _ => EnvFilter::new("src_pages=debug"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn print_report(config: &Configuration, report: &RunReport) {
    if report.discovered == 0 {
        println!("No files to process");
        return;
    }

    let selection = &report.selection;
    for skipped in selection.skipped.iter() {
        println!(
            "  {} {}: {}",
            console::style("Skipped").yellow(),
            skipped.path.display(),
            skipped.reason
        );
    }

    let Some(output) = &report.output else {
        println!("No files fit within {} pages", config.defaults.pages);
        return;
    };

    println!();
    println!("  PDF:            {}", output.display());
    println!(
        "  Pages:          {} (estimated {:.1})",
        report.page_count, selection.total_pages
    );
    println!("  Files included: {}", selection.included.len());
    println!("  Files skipped:  {}", selection.skipped.len());
    if let Some(title_file) = &report.title_file {
        println!("  Title file:     {}", title_file.display());
    }
    for (language, summary) in report.summaries.iter() {
        if report.summaries.len() > 1 {
            println!("  Summary ({language}): {summary}");
        } else {
            println!("  Summary:        {summary}");
        }
    }
    if config.defaults.update_ignore {
        println!(
            "  Added {} file(s) to {}",
            report.recorded,
            config.ignore_file.display()
        );
    }
}
