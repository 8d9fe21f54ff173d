use std::env;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;
use zenith_array_field::{render_request, ClientAssets, RenderRequest};

const USAGE: &str = "usage: zenith-array-field [--out-dir <path>] [--json] < request.json";

#[derive(Debug, Default)]
struct Args {
    /// Where to emit the runtime script and stylesheet.
    out_dir: Option<PathBuf>,
    /// Print the full render output as JSON instead of the HTML fragment.
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("[zenith-array-field] {err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = parse_args(env::args().skip(1))?;

    let mut stdin_payload = String::new();
    io::stdin()
        .read_to_string(&mut stdin_payload)
        .context("failed to read stdin")?;

    if stdin_payload.trim().is_empty() {
        bail!("stdin payload is empty");
    }

    let request: RenderRequest =
        serde_json::from_str(&stdin_payload).context("invalid render request JSON")?;
    let output = render_request(&request)?;

    let mut html = output.html.clone();
    if let Some(out_dir) = &args.out_dir {
        let assets = ClientAssets::generate(&request.config.controls)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let emitted = runtime
            .block_on(assets.write_to(out_dir))
            .with_context(|| format!("failed to write assets to '{}'", out_dir.display()))?;
        tracing::info!(js = %emitted.js.display(), css = %emitted.css.display(), "assets emitted");

        html = format!("{}{}\n{}", assets.link_tag(), assets.script_tag(), html);
    }

    let mut stdout = io::stdout().lock();
    if args.json {
        let mut value = serde_json::to_value(&output)?;
        value["html"] = serde_json::Value::String(html);
        serde_json::to_writer(&mut stdout, &value)?;
    } else {
        stdout.write_all(html.as_bytes())?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-dir" => {
                let value = args.next().context("missing value for --out-dir")?;
                parsed.out_dir = Some(PathBuf::from(value));
            }
            "--json" => parsed.json = true,
            _ => bail!("unknown argument '{arg}'. {USAGE}"),
        }
    }

    Ok(parsed)
}
