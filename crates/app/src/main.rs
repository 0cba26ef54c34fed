mod settings;

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use layerflow_layout::{CancelToken, GraphModel, LayeredLayout, Layout};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Compute a left-to-right layered layout for a JSON graph
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Graph as JSON (`{"nodes": [...], "edges": [...]}`), stdin when omitted
    input: Option<PathBuf>,

    /// Layout theme as a RON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the layout JSON, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,

    /// Give up on the layout after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn read_graph(input: Option<&PathBuf>) -> Result<GraphModel> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read graph from stdin")?;
            text
        }
    };

    serde_json::from_str(&text).context("Graph is not valid JSON")
}

fn write_layout(layout: &Layout, output: Option<&PathBuf>, pretty: bool) -> Result<()> {
    let mut json = if pretty {
        serde_json::to_string_pretty(layout)?
    } else {
        serde_json::to_string(layout)?
    };
    json.push('\n');

    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write layout to {}", path.display())),
        None => std::io::stdout()
            .write_all(json.as_bytes())
            .context("Failed to write layout to stdout"),
    }
}

/// Trip the token once `timeout` has elapsed
fn arm_watchdog(cancel: &CancelToken, timeout: Duration) {
    let cancel = cancel.clone();
    std::thread::spawn(move || {
        std::thread::sleep(timeout);
        cancel.cancel();
    });
}

fn run(args: &Args) -> Result<Layout> {
    let config = settings::load_config(args.config.as_deref())?;
    let graph = read_graph(args.input.as_ref())?;
    info!(
        "Laying out {} nodes and {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );

    let cancel = CancelToken::new();
    if let Some(ms) = args.timeout_ms {
        arm_watchdog(&cancel, Duration::from_millis(ms));
    }

    let layout = LayeredLayout::new(config)
        .layout_model_with_cancel(&graph, &cancel)
        .context("Layout failed")?;

    for diagnostic in &layout.diagnostics {
        warn!("{diagnostic:?}");
    }

    write_layout(&layout, args.output.as_ref(), args.pretty)?;
    Ok(layout)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let layout = run(&args)?;
    info!(
        "Wrote {} positions on a {}x{} canvas",
        layout.positions.len(),
        layout.canvas.width,
        layout.canvas.height
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_log::test;

    fn graph_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn args(input: &tempfile::NamedTempFile, output: &tempfile::NamedTempFile) -> Args {
        Args {
            input: Some(input.path().to_path_buf()),
            config: None,
            output: Some(output.path().to_path_buf()),
            pretty: true,
            timeout_ms: None,
        }
    }

    #[test]
    fn lays_out_a_graph_file() {
        let input = graph_file(
            r#"{
                "nodes": [
                    { "id": "A", "kind": "Input" },
                    { "id": "B", "kind": "Conv" },
                    { "id": "C", "kind": "Output" }
                ],
                "edges": [
                    { "source": "A", "target": "B" },
                    { "source": "B", "target": "C" },
                    { "source": "X", "target": "A" }
                ]
            }"#,
        );
        let output = tempfile::NamedTempFile::new().unwrap();

        let layout = run(&args(&input, &output)).unwrap();

        let written: Layout =
            serde_json::from_str(&std::fs::read_to_string(output.path()).unwrap()).unwrap();
        assert_eq!(written, layout);
        assert_eq!(layout.positions["C"].x, 720.0);
        assert_eq!(layout.diagnostics.len(), 1);
    }

    #[test]
    fn reports_broken_json() {
        let input = graph_file("{ nodes: ");
        let output = tempfile::NamedTempFile::new().unwrap();

        let err = run(&args(&input, &output)).unwrap_err();
        assert_eq!(err.to_string(), "Graph is not valid JSON");
    }

    #[test]
    fn zero_timeout_eventually_cancels() {
        let cancel = CancelToken::new();
        arm_watchdog(&cancel, Duration::ZERO);

        for _ in 0..1000 {
            if cancel.is_cancelled() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("watchdog never tripped the token");
    }

    #[test]
    fn args_parse_from_the_command_line() {
        let args = Args::parse_from([
            "layerflow",
            "graph.json",
            "--config",
            "theme.ron",
            "--pretty",
            "--timeout-ms",
            "250",
        ]);

        assert_eq!(args.input, Some(PathBuf::from("graph.json")));
        assert_eq!(args.config, Some(PathBuf::from("theme.ron")));
        assert!(args.pretty);
        assert_eq!(args.timeout_ms, Some(250));
        assert_eq!(args.output, None);
    }
}
