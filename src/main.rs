//! CLI entry point for `exportmail`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use exportmail::config::Config;
use exportmail::export::{Batch, CopyExporter};
use exportmail::job::{export_all, ExportItem};
use exportmail::launch::SystemLauncher;
use exportmail::mailer::Mailer;
use exportmail::metadata::FileSizeSummary;
use exportmail::profile::{FixedHandler, ProfileResolver};

/// How long `send` waits for the mail client to report a failure.
const LAUNCH_GRACE: Duration = Duration::from_secs(3);

/// Send images to your default mail client as attachments.
#[derive(Parser)]
#[command(name = "exportmail", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Export images and open a new mail with them attached
    Send {
        /// Images to attach
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Target extension of exported files (keeps the source one if unset)
        #[arg(short, long)]
        format: Option<String>,
        /// Mail subject
        #[arg(short, long)]
        subject: Option<String>,
        /// Mail handler to use instead of the desktop default
        #[arg(long, env = "EXPORTMAIL_HANDLER")]
        handler: Option<String>,
        /// Print the composed message instead of launching the mail client
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the mail client profile that would be used
    Profile {
        /// Mail handler to use instead of the desktop default
        #[arg(long, env = "EXPORTMAIL_HANDLER")]
        handler: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the configuration file, or create it with defaults
    Config {
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = exportmail::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Send {
            files,
            format,
            subject,
            handler,
            dry_run,
        } => cmd_send(&config, &files, format, subject, handler, dry_run),
        Commands::Profile { handler, json } => cmd_profile(&config, handler, json),
        Commands::Config { init } => cmd_config(&config, init),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = exportmail::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "exportmail.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn resolver(config: &Config, handler: Option<String>) -> ProfileResolver {
    match handler {
        Some(handler) => ProfileResolver::new(FixedHandler::new(handler)),
        None => config.mail.resolver(),
    }
}

/// Export the given files and hand them to the mail client.
fn cmd_send(
    config: &Config,
    files: &[PathBuf],
    format: Option<String>,
    subject: Option<String>,
    handler: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let temp_dir = config.export.temp_dir();
    std::fs::create_dir_all(&temp_dir)?;

    let mut metadata = FileSizeSummary::new();
    let mut items = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let image_id = i as u32 + 1;
        let source = absolute(file)?;
        metadata.insert(image_id, &source);
        items.push(ExportItem::new(image_id, source));
    }

    let mailer = Mailer::new(resolver(config, handler), SystemLauncher)
        .with_metadata(metadata)
        .with_subject(subject.unwrap_or_else(|| config.mail.subject.clone()));

    let batch = Batch::new(CopyExporter).with_temp_dir(&temp_dir);
    let format = format.or_else(|| config.export.format.clone());

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Exporting [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let failures = export_all(&batch, &items, format.as_deref(), &|current, _total| {
        pb.set_position(current as u64);
    });
    pb.finish_and_clear();

    for failure in &failures {
        eprintln!("  Skipped {}: {}", failure.source.display(), failure.error);
    }

    if dry_run {
        let records = batch.records();
        if records.is_empty() {
            return Err(exportmail::error::Error::EmptyBatch.into());
        }
        let (profile, message) = mailer.prepare(&records)?;
        println!("  Profile: {} ({:?})", profile.name, profile.dispatch_mode);
        println!("  Exported {} file(s) to {}", records.len(), temp_dir.display());
        println!();
        println!("{message}");
        return Ok(());
    }

    let count = batch.len();
    let launch = batch.finalize(&mailer)?;
    // A client started by the dispatch runs until the user closes it.
    match launch.wait_timeout(LAUNCH_GRACE) {
        Some(outcome) => outcome?,
        None => tracing::info!("Mail client still running, not waiting for it"),
    }
    println!("  Handed {count} attachment(s) to the mail client");

    Ok(())
}

/// Show the resolved mail client profile.
fn cmd_profile(config: &Config, handler: Option<String>, json: bool) -> anyhow::Result<()> {
    let profile = resolver(config, handler).resolve();

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!();
        println!("  {:<22} {}", "Profile", profile.name);
        println!("  {:<22} {:?}", "Dispatch mode", profile.dispatch_mode);
        println!("  {:<22} {}", "Template", profile.template);
        println!("  {:<22} {}", "Attachment template", profile.attachment_template);
        println!(
            "  {:<22} {:?}",
            "Attachment separator", profile.attachment_separator
        );
        println!();
    }
    Ok(())
}

/// Print the configuration file, optionally writing the defaults first.
fn cmd_config(config: &Config, init: bool) -> anyhow::Result<()> {
    let path = exportmail::config::config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if init {
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }
        exportmail::config::save_config(&Config::default())?;
        println!("  Created {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "exportmail", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
