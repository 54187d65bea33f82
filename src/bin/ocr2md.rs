//! CLI binary for ocr2md.
//!
//! A thin shim over the library crate that maps CLI flags (or a host
//! parameter JSON file) to `ToolParameters` + `ToolConfig` and prints the
//! resulting message.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr2md::{
    invoke, ImagePolicy, InvocationProgressCallback, ProgressCallback, ResponseMode, Stage,
    ToolConfig, ToolMessage, ToolParameters, UploadedFile,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that shows the current pipeline stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("OCR");
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl InvocationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(stage.to_string());
    }

    fn on_retry(&self, attempt: u32, max_retries: u32, error: &str) {
        self.bar
            .println(format!("  {} retry {attempt}/{max_retries}: {error}", red("↻")));
    }

    fn on_invocation_complete(&self, is_error: bool) {
        if is_error {
            self.bar.finish_with_message(red("failed"));
        } else {
            self.bar.finish_with_message(green("done ✓"));
        }
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Recognise text lines in an uploaded image
  ocr2md --file-url https://files.local/abc --filename receipt.png \
         --service-url http://localhost:9003/ocr --mode line-list

  # Markdown with inlined figures, written to ./out/scan.md
  ocr2md --file-url https://files.local/abc --filename scan.png \
         --service-url http://localhost:9005/ocr --mode markdown --output-dir out

  # Parameters exactly as the plugin host sends them
  echo '{"file":{"url":"…","filename":"a.png"},"service_url":"…"}' | ocr2md --params -

ENVIRONMENT VARIABLES:
  OCR2MD_SERVICE_URL      OCR service endpoint
  OCR2MD_MODE             line-list | markdown | auto
  OCR2MD_IMAGE_POLICY     sniff | strict
  RUST_LOG                tracing filter (overrides --verbose/--quiet)
"#;

/// Send an uploaded file to an OCR service and print the result.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2md",
    version,
    about = "Send a file to an OCR HTTP service; print text lines or write Markdown",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Host parameter JSON file (`-` for stdin). Overrides --file-url/--filename/--service-url.
    #[arg(long)]
    params: Option<PathBuf>,

    /// URL the uploaded file is downloaded from.
    #[arg(long)]
    file_url: Option<String>,

    /// Name of the uploaded file (extension matters).
    #[arg(long)]
    filename: Option<String>,

    /// OCR service endpoint receiving the multipart POST.
    #[arg(long, env = "OCR2MD_SERVICE_URL")]
    service_url: Option<String>,

    /// Response contract of the service.
    #[arg(long, env = "OCR2MD_MODE", value_enum, default_value = "auto")]
    mode: ModeArg,

    /// Handling of non-image uploads.
    #[arg(long, env = "OCR2MD_IMAGE_POLICY", value_enum, default_value = "sniff")]
    image_policy: PolicyArg,

    /// JPEG quality for RGBA → RGB conversion (1–100).
    #[arg(long, env = "OCR2MD_JPEG_QUALITY", default_value_t = 100,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// File download timeout in seconds.
    #[arg(long, env = "OCR2MD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// OCR request timeout in seconds.
    #[arg(long, env = "OCR2MD_OCR_TIMEOUT", default_value_t = 60)]
    ocr_timeout: u64,

    /// Retries of the OCR request on timeout or connection failure.
    #[arg(long, env = "OCR2MD_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Directory the Markdown attachment is written to.
    #[arg(short, long, env = "OCR2MD_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Print the message envelope as JSON instead of acting on it.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except the result.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ModeArg {
    LineList,
    Markdown,
    Auto,
}

impl From<ModeArg> for ResponseMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::LineList => ResponseMode::LineList,
            ModeArg::Markdown => ResponseMode::Markdown,
            ModeArg::Auto => ResponseMode::Auto,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PolicyArg {
    Sniff,
    Strict,
}

impl From<PolicyArg> for ImagePolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Sniff => ImagePolicy::Sniff,
            PolicyArg::Strict => ImagePolicy::Strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let params = build_params(&cli)?;

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;

    let message = invoke(&params, &config).await;

    if cli.json {
        let json = serde_json::to_string_pretty(&message).context("Failed to serialise message")?;
        println!("{json}");
        return Ok(());
    }

    match message {
        ToolMessage::Text { ref text } => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
        }
        ToolMessage::Blob { .. } => {
            let path = message
                .write_blob_to(&cli.output_dir)
                .with_context(|| format!("Failed to write into {}", cli.output_dir.display()))?;
            if let Some(path) = path {
                if !cli.quiet {
                    eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
                }
            }
        }
    }

    Ok(())
}

/// Assemble host parameters from `--params` or the individual flags.
fn build_params(cli: &Cli) -> Result<ToolParameters> {
    if let Some(ref path) = cli.params {
        let raw = if path.as_os_str() == "-" {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read parameters from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read parameters from {:?}", path))?
        };
        let mut params: ToolParameters =
            serde_json::from_str(&raw).context("Parameters are not valid JSON")?;
        if params.service_url.is_none() {
            params.service_url = cli.service_url.clone();
        }
        return Ok(params);
    }

    let file = match (&cli.file_url, &cli.filename) {
        (Some(url), Some(name)) => Some(UploadedFile::new(url, name)),
        (Some(url), None) => Some(UploadedFile::new(url, filename_from_url(url))),
        _ => None,
    };

    Ok(ToolParameters {
        file,
        service_url: cli.service_url.clone(),
    })
}

/// Map CLI args to `ToolConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ToolConfig> {
    let mut builder = ToolConfig::builder()
        .response_mode(cli.mode.clone().into())
        .image_policy(cli.image_policy.clone().into())
        .jpeg_quality(cli.jpeg_quality)
        .download_timeout_secs(cli.download_timeout)
        .ocr_timeout_secs(cli.ocr_timeout)
        .max_retries(cli.max_retries);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Last non-empty path segment of `url`, or a generic name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "upload".to_string())
}
