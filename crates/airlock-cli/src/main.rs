//! airlock: move a file across an air gap as a sequence of barcode frames
//!
//! Commands:
//!   send <file>               - encrypt and frame a file, one frame string per line
//!   receive <frames>...       - feed captured frame strings, decrypt, write the file
//!   config show               - display current configuration
//!
//! Frame files stand in for the barcode renderer and scanner: each line is
//! exactly the string one barcode would carry, and lines may arrive in any
//! order, repeated, or mixed with unrelated scans.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use airlock_assembler::{AssemblyState, Observation, SharedAssembler};
use airlock_core::config::{validate_capacity, AirlockConfig};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "airlock",
    version,
    about = "Air-gapped file transfer over barcodes",
    long_about = "airlock: password-encrypt a file, split it into barcode-sized frames, \
                  and rebuild it from frames captured in any order"
)]
struct Cli {
    /// Path to airlock configuration file
    #[arg(
        long,
        short = 'c',
        env = "AIRLOCK_CONFIG",
        default_value = "~/.config/airlock/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long, env = "AIRLOCK_LOG")]
    log: Option<String>,

    /// Log format; overrides config
    #[arg(long, env = "AIRLOCK_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file and write its frames, one wire string per line
    Send {
        /// File to send
        file: PathBuf,
        /// Payload characters per frame (overrides config)
        #[arg(long, short = 'n')]
        capacity: Option<usize>,
        /// Output path for the frame strings (default: <filename>.frames)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Encryption password (prompted when absent)
        #[arg(long, env = "AIRLOCK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Rebuild a file from captured frame strings
    Receive {
        /// Files of captured strings, one per line, any order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory to write the received file into (overrides config)
        #[arg(long, short = 'd')]
        out_dir: Option<PathBuf>,
        /// Decryption password (prompted when absent)
        #[arg(long, env = "AIRLOCK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let (config, from_file) = load_config(&config_path).await?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, &format);

    if !from_file {
        tracing::debug!(
            "config file not found: {}  (using defaults)",
            config_path.display()
        );
    }

    match cli.command {
        Commands::Send {
            file,
            capacity,
            out,
            password,
        } => cmd_send(&config, &file, capacity, out.as_deref(), password).await,
        Commands::Receive {
            inputs,
            out_dir,
            password,
        } => cmd_receive(&config, &inputs, out_dir.as_deref(), password).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path, from_file),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

async fn load_config(path: &Path) -> Result<(AirlockConfig, bool)> {
    if !path.exists() {
        return Ok((AirlockConfig::default(), false));
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config: {}", path.display()))?;
    let config: AirlockConfig =
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config: {}", path.display()))?;
    Ok((config, true))
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

// ── Password input ────────────────────────────────────────────────────────────

/// Use the provided password or prompt for one (twice when `confirm`).
fn read_password(provided: Option<String>, confirm: bool) -> Result<SecretString> {
    let password = match provided {
        Some(p) => p,
        None => {
            let first = rpassword::prompt_password("Password: ").context("reading password")?;
            if confirm {
                let second = rpassword::prompt_password("Confirm password: ")
                    .context("reading password confirmation")?;
                if first != second {
                    anyhow::bail!("passwords do not match");
                }
            }
            first
        }
    };

    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    Ok(SecretString::from(password))
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(total: u64, prefix: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("progress bar template")?
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    Ok(pb)
}

fn make_spinner(prefix: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .context("spinner template")?,
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

// ── `airlock send` ────────────────────────────────────────────────────────────

async fn cmd_send(
    config: &AirlockConfig,
    file: &Path,
    capacity: Option<usize>,
    out: Option<&Path>,
    password: Option<String>,
) -> Result<()> {
    let capacity = capacity.unwrap_or(config.transfer.capacity);
    validate_capacity(capacity)?;

    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("not a file path: {}", file.display()))?;
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let password = read_password(password, true)?;

    let pb = make_spinner("send")?;
    pb.set_message("deriving key and encrypting...");

    // PBKDF2 runs on the blocking pool
    let tx = tokio::task::spawn_blocking(move || {
        airlock_chunks::frame_file(&data, &filename, &password, capacity)
    })
    .await
    .context("encryption task failed")??;
    pb.finish_and_clear();

    let wires = tx.wire_strings()?;
    let out_path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.frames", tx.filename)));

    let mut body = wires.join("\n");
    body.push('\n');
    tokio::fs::write(&out_path, body)
        .await
        .with_context(|| format!("writing frames: {}", out_path.display()))?;

    println!("Framed {} → {}", file.display(), out_path.display());
    println!("  size:      {}", fmt_bytes(tx.size));
    println!("  envelope:  {} chars", tx.envelope_len);
    println!("  frames:    {} (capacity {})", tx.len(), capacity);
    Ok(())
}

// ── `airlock receive` ─────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    accepted: u64,
    duplicates: u64,
    rejected: u64,
}

/// Feed every non-blank line of `content` to the assembler.
///
/// Lines that are not valid UTF-8 cannot be frames and count as rejected.
fn ingest(assembler: &SharedAssembler, content: &[u8], tally: &mut Tally, pb: &ProgressBar) {
    for (lineno, raw) in content.split(|&b| b == b'\n').enumerate() {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                tracing::warn!(line = lineno + 1, error = %e, "skipping non-UTF-8 captured line");
                tally.rejected += 1;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        match assembler.observe(line) {
            Observation::Accepted { total, .. } => {
                tally.accepted += 1;
                pb.set_length(total);
                pb.inc(1);
            }
            Observation::DuplicateIgnored { .. } => tally.duplicates += 1,
            rejected => {
                if let Some(err) = rejected.rejection() {
                    tracing::warn!(error = %err, "skipping captured string");
                }
                tally.rejected += 1;
            }
        }
    }
}

async fn cmd_receive(
    config: &AirlockConfig,
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    password: Option<String>,
) -> Result<()> {
    let assembler = SharedAssembler::new();
    let mut tally = Tally::default();
    let pb = make_progress_bar(0, "receive")?;

    for input in inputs {
        let content = tokio::fs::read(input)
            .await
            .with_context(|| format!("reading captured frames: {}", input.display()))?;
        ingest(&assembler, &content, &mut tally, &pb);
    }
    pb.finish_and_clear();

    println!(
        "Captured: {} accepted, {} duplicate, {} rejected",
        tally.accepted, tally.duplicates, tally.rejected
    );

    match assembler.state() {
        AssemblyState::Empty => anyhow::bail!("no airlock frames found in input"),
        AssemblyState::Collecting { received, total } => {
            let missing = assembler.missing_indices();
            anyhow::bail!(
                "incomplete transmission: {received}/{total} frames; missing {}",
                fmt_indices(&missing)
            );
        }
        AssemblyState::Complete { .. } => {}
    }

    let password = read_password(password, false)?;
    let spinner = make_spinner("receive")?;
    spinner.set_message("deriving key and decrypting...");

    let worker = assembler.clone();
    let result = tokio::task::spawn_blocking(move || worker.finalize(&password))
        .await
        .context("decryption task failed")?;
    spinner.finish_and_clear();

    let file = match result {
        Ok(file) => file,
        Err(e) if e.is_authentication_failure() => {
            anyhow::bail!("decryption failed: wrong password or corrupted frames")
        }
        Err(e) => return Err(e.into()),
    };

    let name = safe_filename(&file.filename)?;
    let dir = out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| expand_tilde(&config.transfer.output_dir));
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("creating output dir: {}", dir.display()))?;
    let dest = dir.join(name);
    tokio::fs::write(&dest, &file.data)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;

    println!("Received:");
    println!("  file:   {}", dest.display());
    println!("  bytes:  {}", fmt_bytes(file.data.len() as u64));
    Ok(())
}

/// Final path component of a transmitted filename; refuses names that
/// would escape or clobber the output directory.
fn safe_filename(name: &str) -> Result<&str> {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    if base.is_empty() || base == "." || base == ".." {
        anyhow::bail!("refusing unsafe filename from sender: {name:?}");
    }
    Ok(base)
}

// ── `airlock config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &AirlockConfig, config_path: &Path, from_file: bool) -> Result<()> {
    if from_file {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Formatting ────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Collapse ascending indices into ranges: `[0, 1, 2, 5, 7, 8]` → `0-2, 5, 7-8`
fn fmt_indices(indices: &[u64]) -> String {
    let mut parts = Vec::new();
    let mut iter = indices.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use airlock_chunks::frame_file;

    #[test]
    fn safe_filename_strips_directories() {
        assert_eq!(safe_filename("a.txt").unwrap(), "a.txt");
        assert_eq!(safe_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(safe_filename("C:\\Users\\me\\doc.pdf").unwrap(), "doc.pdf");
    }

    #[test]
    fn safe_filename_rejects_empty_and_dots() {
        assert!(safe_filename("").is_err());
        assert!(safe_filename("dir/").is_err());
        assert!(safe_filename("..").is_err());
        assert!(safe_filename("a/.").is_err());
    }

    #[test]
    fn fmt_indices_collapses_runs() {
        assert_eq!(fmt_indices(&[]), "");
        assert_eq!(fmt_indices(&[3]), "3");
        assert_eq!(fmt_indices(&[0, 1, 2, 5, 7, 8]), "0-2, 5, 7-8");
    }

    #[test]
    fn fmt_bytes_units() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(2048), "2.0 KB");
        assert_eq!(fmt_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn expand_tilde_uses_home() {
        let home = std::env::var("HOME").unwrap_or_default();
        assert_eq!(
            expand_tilde(Path::new("~/x/config.toml")),
            PathBuf::from(home).join("x/config.toml")
        );
        assert_eq!(expand_tilde(Path::new("/etc/a")), PathBuf::from("/etc/a"));
    }

    #[test]
    fn ingest_counts_each_outcome() {
        let password = SecretString::from("pw");
        let wires = frame_file(b"hello123!", "a.txt", &password, 32)
            .unwrap()
            .wire_strings()
            .unwrap();
        let content = format!(
            "{}\n\nnot a frame\n{}\n{}\n{}\n",
            wires[2], wires[0], wires[2], wires[1]
        );

        let assembler = SharedAssembler::new();
        let mut tally = Tally::default();
        ingest(&assembler, content.as_bytes(), &mut tally, &ProgressBar::hidden());

        assert_eq!(
            tally,
            Tally {
                accepted: 3,
                duplicates: 1,
                rejected: 1
            }
        );
        assert_eq!(assembler.state(), AssemblyState::Complete { total: 3 });
    }

    #[test]
    fn ingest_skips_non_utf8_lines() {
        let password = SecretString::from("pw");
        let wires = frame_file(b"hello123!", "a.txt", &password, 32)
            .unwrap()
            .wire_strings()
            .unwrap();

        let mut content = Vec::new();
        content.extend_from_slice(wires[0].as_bytes());
        content.extend_from_slice(b"\r\n\xff\xfe garbled scan\n");
        content.extend_from_slice(wires[1].as_bytes());
        content.push(b'\n');
        content.extend_from_slice(wires[2].as_bytes());

        let assembler = SharedAssembler::new();
        let mut tally = Tally::default();
        ingest(&assembler, &content, &mut tally, &ProgressBar::hidden());

        assert_eq!(
            tally,
            Tally {
                accepted: 3,
                duplicates: 0,
                rejected: 1
            }
        );
        assert_eq!(assembler.state(), AssemblyState::Complete { total: 3 });
    }

    #[tokio::test]
    async fn load_config_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, from_file) = load_config(&dir.path().join("absent.toml")).await.unwrap();
        assert!(!from_file);
        assert_eq!(config.transfer.capacity, airlock_core::DEFAULT_CAPACITY);
    }

    #[tokio::test]
    async fn load_config_rejects_capacity_over_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[transfer]\ncapacity = 999999\n").unwrap();
        assert!(load_config(&path).await.is_err());
    }
}
