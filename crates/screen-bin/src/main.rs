//! nvim-screen entrypoint: drives the screen pipeline headless, either by
//! replaying a captured RPC stream or by embedding a live editor, and writes
//! the final frame as a PPM image.
use anyhow::{Context, Result};
use clap::Parser;
use core_bridge::{MsgpackWriter, RpcSink, read_message};
use core_config::{Config, load_from};
use core_events::Action;
use core_frontend::Frontend;
use core_render::PixelBuffer;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Once;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "nvim-screen.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "nvim-screen", version, about = "Headless Neovim screen renderer")]
struct Args {
    /// Captured editor output (msgpack-RPC messages) to replay. When omitted
    /// the editor from the `[editor]` config section is spawned.
    pub capture: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `nvim-screen.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Viewport width in pixels (overrides `[screen] width`).
    #[arg(long)]
    pub width: Option<u32>,
    /// Viewport height in pixels (overrides `[screen] height`).
    #[arg(long)]
    pub height: Option<u32>,
    /// Where the final frame is written.
    #[arg(long, default_value = "screen.ppm")]
    pub out: PathBuf,
    /// Record outbound requests while replaying.
    #[arg(long = "rpc-out")]
    pub rpc_out: Option<PathBuf>,
    /// Input sent after attaching, in editor key notation. A spawned editor
    /// runs until it exits, so end with something like `:qa!<CR>`.
    #[arg(long = "send")]
    pub send: Vec<String>,
    /// Directory for `nvim-screen.log`.
    #[arg(long = "log-dir", default_value = ".")]
    pub log_dir: PathBuf,
}

#[derive(Default)]
struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn configure_logging(&mut self, log_dir: &Path) -> Result<()> {
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    fn load_config(args: &Args) -> Result<Config> {
        let mut config = load_from(args.config.clone())?;
        if let Some(width) = args.width {
            config.file.screen.width = width;
        }
        if let Some(height) = args.height {
            config.file.screen.height = height;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::default();
    startup.configure_logging(&args.log_dir)?;
    AppStartup::install_panic_hook();

    let config = AppStartup::load_config(&args)?;
    let capture_str = args.capture.as_ref().map(|p| p.to_string_lossy().to_string());
    let config_str = config.source.as_ref().map(|p| p.to_string_lossy().to_string());
    info!(
        target: "runtime.startup",
        capture = capture_str.as_deref(),
        config = config_str.as_deref(),
        width = config.file.screen.width,
        height = config.file.screen.height,
        "startup"
    );

    let frame = match args.capture.as_deref() {
        Some(capture) => replay(capture, args.rpc_out.as_deref(), &args.send, &config)?,
        None => embed(&args.send, &config)?,
    };

    let out = File::create(&args.out).with_context(|| format!("creating {}", args.out.display()))?;
    let mut out = BufWriter::new(out);
    frame.write_ppm(&mut out)?;
    out.flush()?;
    info!(target: "runtime", out = %args.out.display(), "frame_written");
    Ok(())
}

/// Replays a capture file; outbound requests go to `rpc_out` or nowhere.
fn replay(capture: &Path, rpc_out: Option<&Path>, send: &[String], config: &Config) -> Result<PixelBuffer> {
    let input = File::open(capture).with_context(|| format!("opening capture {}", capture.display()))?;
    let sink: Box<dyn Write> = match rpc_out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::sink()),
    };
    let frontend = Frontend::new(PixelBuffer::new(1, 1)?, MsgpackWriter::new(sink), config);
    run_session(frontend, BufReader::new(input), send)
}

/// Spawns the configured editor with its UI embedded over stdio.
fn embed(send: &[String], config: &Config) -> Result<PixelBuffer> {
    let editor = &config.file.editor;
    let mut child = Command::new(&editor.command)
        .args(&editor.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning {}", editor.command))?;
    let stdin = child.stdin.take().context("editor stdin not captured")?;
    let stdout = child.stdout.take().context("editor stdout not captured")?;
    info!(target: "runtime.startup", command = %editor.command, pid = child.id(), "editor_spawned");

    let frontend = Frontend::new(PixelBuffer::new(1, 1)?, MsgpackWriter::new(stdin), config);
    let frame = run_session(frontend, BufReader::new(stdout), send)?;
    let status = child.wait()?;
    info!(target: "runtime", %status, "editor_exited");
    Ok(frame)
}

/// Starts the frontend and feeds it every message until the stream ends.
fn run_session<R, I>(mut frontend: Frontend<PixelBuffer, R>, mut input: I, send: &[String]) -> Result<PixelBuffer>
where
    R: RpcSink + 'static,
    I: Read,
{
    frontend.start()?;
    for keys in send {
        frontend.dispatch(Action::input(keys.as_str()))?;
    }

    let mut messages = 0usize;
    loop {
        match read_message(&mut input) {
            Ok(Some(msg)) => {
                messages += 1;
                if let Err(err) = frontend.handle_rpc(msg) {
                    warn!(target: "runtime", error = %err, "message_failed");
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!(target: "runtime", error = %err, "stream_decode_failed");
                break;
            }
        }
    }
    frontend.disconnected()?;

    let metrics = frontend.render_metrics();
    info!(
        target: "runtime",
        messages,
        text_runs = metrics.text_runs,
        scroll_blits = metrics.scroll_blits,
        "session_finished"
    );
    let frame = frontend.surface().clone();
    Ok(frame)
}
