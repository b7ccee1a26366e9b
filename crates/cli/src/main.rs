//! Canvas CLI - run canvas scripts headlessly.
//!
//! A script is a JSON file holding a window configuration and a list of
//! commands and queries. Each run starts from a fresh, mapped canvas.

mod logger;

use anyhow::{anyhow, bail, Context, Result};
use api::{Query, QueryResult, Script, StepResult, TreeNode};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use logger::{log_section, CanvasLogger};
use scene_graph::CanvasConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Canvas CLI - drive a canvas scene graph from JSON scripts
#[derive(Parser)]
#[command(name = "canvas-cli")]
#[command(about = "Run canvas scene graph scripts")]
struct Cli {
    /// Canvas configuration (JSON) replacing the script's own
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Most detailed log level to print (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Also write logs under this directory, one subdirectory per run
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script and print every step's result as JSON
    Run {
        /// Script file
        script: PathBuf,

        /// Pretty-print the results
        #[arg(long)]
        pretty: bool,
    },

    /// Run a script and print the final item tree
    Tree {
        /// Script file
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level: LevelFilter = cli
        .log_level
        .parse()
        .map_err(|e| anyhow!("Invalid log level {:?}: {}", cli.log_level, e))?;
    CanvasLogger::init(level, cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Run { script, pretty } => {
            let script = load_script(&script, cli.config.as_deref())?;
            run(script, pretty)
        }
        Commands::Tree { script } => {
            let script = load_script(&script, cli.config.as_deref())?;
            print_tree(script)
        }
    }
}

/// Reads a script, replacing its canvas configuration when `config` is given.
fn load_script(path: &Path, config: Option<&Path>) -> Result<Script> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    let mut script = Script::from_json(&json)
        .with_context(|| format!("Failed to parse script: {}", path.display()))?;

    if let Some(config) = config {
        script.config.canvas = load_config(config)?;
    }
    log::info!(
        "loaded {} steps from {}",
        script.steps.len(),
        path.display()
    );
    Ok(script)
}

fn load_config(path: &Path) -> Result<CanvasConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: CanvasConfig = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(config)
}

fn run(script: Script, pretty: bool) -> Result<()> {
    log_section("run");
    let (_session, results) = script.run()?;

    let output = if pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    println!("{}", output);

    let failures = count_failures(&results);
    if failures > 0 {
        bail!("{} of {} steps failed", failures, results.len());
    }
    Ok(())
}

fn print_tree(script: Script) -> Result<()> {
    log_section("tree");
    let (session, results) = script.run()?;
    let failures = count_failures(&results);
    if failures > 0 {
        log::warn!("{} of {} steps failed", failures, results.len());
    }

    match session.query(Query::GetTree) {
        QueryResult::Tree { root } => {
            for line in tree_lines(&root) {
                println!("{}", line);
            }
            Ok(())
        }
        QueryResult::Error { message } => bail!("Failed to read the tree: {}", message),
        other => bail!("Unexpected tree result: {:?}", other),
    }
}

fn count_failures(results: &[StepResult]) -> usize {
    results
        .iter()
        .enumerate()
        .filter(|(index, result)| {
            if result.is_error() {
                log::warn!("step {} failed: {:?}", index, result);
            }
            result.is_error()
        })
        .count()
}

/// One line per item, children indented under their group.
fn tree_lines(root: &TreeNode) -> Vec<String> {
    let mut lines = Vec::new();
    push_tree_lines(root, 0, &mut lines);
    lines
}

fn push_tree_lines(node: &TreeNode, depth: usize, lines: &mut Vec<String>) {
    let info = &node.info;
    let b = &info.bounds;
    let mut line = format!(
        "{:indent$}{} {:?} [{}, {} .. {}, {}]",
        "",
        info.name,
        info.kind,
        b.min.x,
        b.min.y,
        b.max.x,
        b.max.y,
        indent = depth * 2
    );
    if let Some(offset) = info.offset {
        line.push_str(&format!(" offset ({}, {})", offset.x, offset.y));
    }
    if !info.visible {
        line.push_str(" hidden");
    } else if !info.mapped {
        line.push_str(" unmapped");
    }
    lines.push(line);

    for child in &node.children {
        push_tree_lines(child, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCRIPT: &str = r##"{
        "steps": [
            {"type": "create_group", "name": "toolbar", "offset": [5, 5]},
            {"type": "create_rect", "name": "button", "parent": {"item": "toolbar"},
             "position": [0, 0], "size": [10, 4], "fill": "#000000"},
            {"type": "hide", "target": {"item": "button"}},
            {"type": "run_idle"}
        ]
    }"##;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn config_file_replaces_script_config() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_file(dir.path(), "script.json", SCRIPT);
        let config = write_file(dir.path(), "config.json", r#"{"pixels_per_unit": 2.0}"#);

        let script = load_script(&script, Some(&config)).unwrap();
        assert_eq!(script.config.canvas.pixels_per_unit, 2.0);
        assert_eq!(script.steps.len(), 4);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_file(dir.path(), "config.json", r#"{"pixels_per_unit": 0}"#);
        let err = load_config(&config).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid config"));
    }

    #[test]
    fn missing_script_names_the_file() {
        let err = load_script(Path::new("/no/such/script.json"), None).unwrap_err();
        assert!(err.to_string().contains("/no/such/script.json"));
    }

    #[test]
    fn tree_lines_indent_children() {
        let (session, results) = Script::from_json(SCRIPT).unwrap().run().unwrap();
        assert_eq!(count_failures(&results), 0);
        let QueryResult::Tree { root } = session.query(Query::GetTree) else {
            panic!("expected a tree");
        };

        let lines = tree_lines(&root);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("root Group"));
        assert!(lines[1].starts_with("  toolbar Group"));
        assert!(lines[1].contains("offset (5, 5)"));
        assert!(lines[2].starts_with("    button Rect [0, 0 .. 10, 4]"));
        assert!(lines[2].ends_with("hidden"));
    }
}
