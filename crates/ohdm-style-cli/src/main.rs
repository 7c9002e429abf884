#![doc = include_str!("../README.md")]
//! OHDM style compiler
//!
//! Examples:
//!   ohdm-style map.ohdmconfig --classification classes.json
//!   ohdm-style map.ohdmconfig --classification classes.json -o styles -d
//!   ohdm-style map.ohdmconfig --check

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use facet::Facet;
use figue as args;
use ohdm_style_model::InMemoryClassification;
use ohdm_style_parse::ParseError;
use ohdm_style_resolve::{DescriptorSink, Pipeline, PipelineOptions, StyleDescriptor};
use tracing::{debug, info};

mod classification;
mod json;

use classification::{ClassificationError, parse_classification};
use json::descriptor_to_json;

// ============================================================================
// Exit codes
// ============================================================================

const EXIT_SUCCESS: i32 = 0;
const EXIT_SYNTAX_ERROR: i32 = 1;
const EXIT_CLASSIFICATION_ERROR: i32 = 2;
const EXIT_IO_ERROR: i32 = 3;
const EXIT_USAGE_ERROR: i32 = 4;

// ============================================================================
// CLI arguments
// ============================================================================

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_OUTPUT_DIR: &str = "out";

/// `ohdm-style <config> [options]`
#[derive(Facet, Debug, Default)]
struct Args {
    /// Style configuration file
    #[facet(args::positional)]
    config: String,

    /// Classification file (JSON object of class name to subclass names)
    #[facet(args::named, default)]
    classification: Option<String>,

    /// Directory the style descriptors are written to
    #[facet(args::named, args::short = 'o', default)]
    output_dir: Option<String>,

    /// Create default styles for classes the configuration does not declare
    #[facet(args::named, args::short = 'd', default)]
    generate_defaults: bool,

    /// Only check the configuration for syntax errors
    #[facet(args::named, default)]
    check: bool,

    /// Longest allowed chain of sameAs references
    #[facet(args::named, default)]
    max_reference_depth: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    if raw_args.is_empty() || raw_args[0] == "--help" || raw_args[0] == "-h" {
        print_help();
        std::process::exit(EXIT_SUCCESS);
    }

    if raw_args[0] == "--version" || raw_args[0] == "-V" {
        println!("ohdm-style {VERSION}");
        std::process::exit(EXIT_SUCCESS);
    }

    match run(&raw_args) {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            match &e {
                CliError::Syntax {
                    error,
                    source,
                    filename,
                } => error.write_report(filename, source, std::io::stderr()),
                _ => eprintln!("error: {e}"),
            }
            std::process::exit(e.exit_code());
        }
    }
}

fn print_help() {
    eprintln!("ohdm-style {VERSION} - compiler for OHDM map style configurations\n");
    eprintln!("USAGE:");
    eprintln!("    ohdm-style <config> --classification <file.json> [options]\n");
    eprintln!("OPTIONS:");
    eprintln!("        --classification <FILE>     Classes and subclasses (JSON)");
    eprintln!("    -o, --output-dir <DIR>          Output directory (default: out)");
    eprintln!("    -d, --generate-defaults         Style undeclared classes with defaults");
    eprintln!("        --check                     Only check the configuration syntax");
    eprintln!("        --max-reference-depth <N>   Longest sameAs chain (default: 10)\n");
    eprintln!("EXAMPLES:");
    eprintln!("    ohdm-style map.ohdmconfig --classification classes.json");
    eprintln!("    ohdm-style map.ohdmconfig --check");
}

fn run(raw_args: &[String]) -> Result<(), CliError> {
    let args_strs: Vec<&str> = raw_args.iter().map(|s| s.as_str()).collect();
    let opts: Args =
        figue::from_slice(&args_strs).map_err(|e| CliError::Usage(e.to_string()))?;

    let source = std::fs::read_to_string(&opts.config)
        .map_err(|e| CliError::Io(io::Error::new(e.kind(), format!("{}: {e}", opts.config))))?;
    let parse_result = ohdm_style_parse::parse(&source).map_err(|error| CliError::Syntax {
        error,
        source: source.clone(),
        filename: opts.config.clone(),
    })?;

    if opts.check {
        println!("{}: {}", opts.config, parse_result);
        return Ok(());
    }

    let Some(classification_path) = opts.classification.as_deref() else {
        return Err(CliError::Usage(
            "--classification is required unless --check is given".into(),
        ));
    };
    let classification = load_classification(classification_path)?;

    let mut options = PipelineOptions::new().generate_defaults(opts.generate_defaults);
    if let Some(depth) = opts.max_reference_depth {
        options = options.max_reference_depth(depth);
    }

    let output_dir = PathBuf::from(opts.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR));
    std::fs::create_dir_all(&output_dir)?;
    let mut sink = DirectorySink::new(&output_dir);
    let issues = Pipeline::new(&classification, options).run_into(parse_result, &mut sink)?;

    println!(
        "wrote {} style descriptors to {} ({} errors, {} warnings)",
        sink.written,
        output_dir.display(),
        issues.errors.len(),
        issues.warnings.len()
    );
    Ok(())
}

fn load_classification(path: &str) -> Result<InMemoryClassification, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(io::Error::new(e.kind(), format!("{path}: {e}"))))?;
    let classification = parse_classification(&text).map_err(|error| CliError::Classification {
        error,
        filename: path.to_string(),
    })?;
    info!(
        "Loaded {} classes from {}",
        classification.len(),
        path
    );
    Ok(classification)
}

// ============================================================================
// Output
// ============================================================================

/// Writes each descriptor to `<dir>/<name>.json`.
struct DirectorySink<'a> {
    dir: &'a Path,
    written: usize,
}

impl<'a> DirectorySink<'a> {
    fn new(dir: &'a Path) -> Self {
        Self { dir, written: 0 }
    }
}

impl DescriptorSink for DirectorySink<'_> {
    type Error = io::Error;

    fn accept(&mut self, descriptor: StyleDescriptor) -> Result<(), Self::Error> {
        let path = self.dir.join(format!("{}.json", descriptor.name));
        let json = descriptor_to_json(&descriptor);
        let output = serde_json::to_string_pretty(&json).map_err(io::Error::other)?;
        std::fs::write(&path, output + "\n")?;
        debug!("Wrote {}", path.display());
        self.written += 1;
        Ok(())
    }
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Usage(String),
    Syntax {
        error: ParseError,
        source: String,
        filename: String,
    },
    Classification {
        error: ClassificationError,
        filename: String,
    },
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Io(_) => EXIT_IO_ERROR,
            CliError::Usage(_) => EXIT_USAGE_ERROR,
            CliError::Syntax { .. } => EXIT_SYNTAX_ERROR,
            CliError::Classification { .. } => EXIT_CLASSIFICATION_ERROR,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Usage(e) => write!(f, "{e}"),
            CliError::Syntax { error, filename, .. } => write!(f, "{filename}: {error}"),
            CliError::Classification { error, filename } => write!(f, "{filename}: {error}"),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    const CONFIG: &str = "
        [waterway] { [river] { [default] { useStyle = Water } } }
        <Water> { * { stroke: #0000ff; } }
    ";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ohdm-style-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_sink_writes_one_file_per_descriptor() {
        let dir = scratch_dir("sink");
        let classification = parse_classification(r#"{"waterway": ["river"]}"#).unwrap();
        let parse_result = ohdm_style_parse::parse(CONFIG).unwrap();
        let mut sink = DirectorySink::new(&dir);
        let issues = Pipeline::new(&classification, PipelineOptions::new())
            .run_into(parse_result, &mut sink)
            .unwrap();
        assert!(issues.is_empty());
        assert_eq!(sink.written, 3);

        let text = std::fs::read_to_string(dir.join("waterway_lines.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["name"], "waterway_lines");
        assert_eq!(value["layers"][0]["name"], "river");
        assert_eq!(
            value["layers"][0]["rules"][0]["symbolizers"][0]["properties"]["stroke"],
            "#0000ff"
        );
        assert!(dir.join("waterway_points.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = scratch_dir("run");
        let config = dir.join("map.ohdmconfig");
        let classes = dir.join("classes.json");
        std::fs::write(&config, CONFIG).unwrap();
        std::fs::write(&classes, r#"{"waterway": ["river"], "landuse": ["forest"]}"#).unwrap();
        let out = dir.join("styles");

        let args: Vec<String> = vec![
            config.display().to_string(),
            "--classification".into(),
            classes.display().to_string(),
            "-o".into(),
            out.display().to_string(),
            "--generate-defaults".into(),
        ];
        run(&args).unwrap();
        let mut written: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        assert_eq!(
            written,
            vec![
                "landuse_lines.json",
                "landuse_points.json",
                "landuse_polygons.json",
                "waterway_lines.json",
                "waterway_points.json",
                "waterway_polygons.json",
            ]
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_exit_codes() {
        let dir = scratch_dir("exit");
        let broken = dir.join("broken.ohdmconfig");
        std::fs::write(&broken, "[waterway] {").unwrap();
        let bad_classes = dir.join("classes.json");
        std::fs::write(&bad_classes, "[]").unwrap();
        let config = dir.join("map.ohdmconfig");
        std::fs::write(&config, CONFIG).unwrap();

        let syntax = run(&[broken.display().to_string(), "--check".into()]).unwrap_err();
        assert_eq!(syntax.exit_code(), EXIT_SYNTAX_ERROR);

        let classification = run(&[
            config.display().to_string(),
            "--classification".into(),
            bad_classes.display().to_string(),
        ])
        .unwrap_err();
        assert_eq!(classification.exit_code(), EXIT_CLASSIFICATION_ERROR);

        let missing = run(&[dir.join("missing").display().to_string(), "--check".into()])
            .unwrap_err();
        assert_eq!(missing.exit_code(), EXIT_IO_ERROR);

        let usage = run(&[config.display().to_string()]).unwrap_err();
        assert_eq!(usage.exit_code(), EXIT_USAGE_ERROR);
        assert_ne!(usage.exit_code(), EXIT_SYNTAX_ERROR);

        run(&[config.display().to_string(), "--check".into()]).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
