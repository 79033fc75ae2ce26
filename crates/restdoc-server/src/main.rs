//! CLI for `restdoc`.
//!
//! Works from a YAML endpoint manifest plus optional settings file; settings
//! are overlaid with `OPENAPI_*` environment variables.
//!
//! # Subcommands
//!
//! ```text
//! # Validate declarations and settings without rendering
//! restdoc check --manifest api.yaml --settings openapi.yaml
//!
//! # Write the served view (or --internal for everything)
//! restdoc render \
//!   --manifest api.yaml \
//!   --settings openapi.yaml \
//!   --format yaml \
//!   --output openapi.yaml
//!
//! # Serve /swagger.json, /swagger.yaml, /swagger and /swagger/ui
//! restdoc serve --manifest api.yaml --settings openapi.yaml --addr 127.0.0.1:7071
//! ```
//!
//! Log output goes to stderr and is filtered by `RUST_LOG` (default `info`).

#![forbid(unsafe_code)]

use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use restdoc::{DocumentFormat, DocumentSettings, Endpoints, Manifest, Origin, TypeCatalog};
use restdoc_server::DocumentService;
use tracing_subscriber::EnvFilter;

/// Declarative API document builder.
#[derive(Parser)]
#[command(name = "restdoc", version, about)]
enum Cli {
    /// Validate the manifest against the settings.
    ///
    /// Reports duplicate or mismatched parameters, unknown security schemes,
    /// and type expressions that name neither a primitive nor a declared type.
    Check(CheckArgs),

    /// Assemble the document and write it to a file or stdout.
    Render(RenderArgs),

    /// Serve the document and the viewer over HTTP.
    Serve(ServeArgs),
}

/// Inputs shared by every subcommand.
#[derive(clap::Args)]
struct SourceArgs {
    /// Path to the endpoint manifest (YAML).
    #[arg(short, long)]
    manifest: PathBuf,

    /// Path to a settings file (YAML). Environment variables override it.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// API version for `info.version`. Overrides the settings.
    #[arg(long)]
    doc_version: Option<String>,

    /// Read `info.version` from this Cargo.toml's package version.
    #[arg(long, conflicts_with = "doc_version")]
    cargo_toml: Option<PathBuf>,
}

#[derive(Parser)]
struct CheckArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Parser)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format: `json` or `yaml`.
    #[arg(short, long, default_value_t = DocumentFormat::Json)]
    format: DocumentFormat,

    /// Output file. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render the internal view with every endpoint and component.
    #[arg(long)]
    internal: bool,

    /// Base URL to list as the requesting host, e.g. `http://localhost:7071`.
    #[arg(long)]
    requesting_host: Option<String>,
}

#[derive(Parser)]
struct ServeArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Socket address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:7071")]
    addr: SocketAddr,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli {
        Cli::Check(args) => run_check(&args),
        Cli::Render(args) => run_render(&args),
        Cli::Serve(args) => run_serve(&args),
    }
}

/// Everything a subcommand needs, loaded and registered.
struct Loaded {
    settings: DocumentSettings,
    endpoints: Endpoints,
    catalog: TypeCatalog,
}

fn load(source: &SourceArgs) -> anyhow::Result<Loaded> {
    let mut settings = match &source.settings {
        Some(path) => DocumentSettings::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?
            .with_env(std::env::vars())
            .context("Invalid OPENAPI_* environment variable")?,
        None => DocumentSettings::from_env().context("Invalid OPENAPI_* environment variable")?,
    };
    let version = resolve_version(source.doc_version.as_deref(), source.cargo_toml.as_deref())?;
    if let Some(version) = version {
        settings.doc_version = version;
    }

    let manifest = Manifest::load(&source.manifest)
        .with_context(|| format!("Failed to load manifest: {}", source.manifest.display()))?;
    let (registry, catalog) = manifest
        .into_parts()
        .context("Failed to register manifest declarations")?;

    Ok(Loaded {
        settings,
        endpoints: registry.freeze(),
        catalog,
    })
}

fn run_check(args: &CheckArgs) -> anyhow::Result<()> {
    let loaded = load(&args.source)?;
    restdoc::validate(&loaded.settings, &loaded.endpoints, &loaded.catalog)
        .context("Validation failed")?;
    eprintln!(
        "OK: {} endpoints, {} declared types, {} security schemes",
        loaded.endpoints.len(),
        loaded.catalog.len(),
        loaded.settings.security_schemes.len(),
    );
    Ok(())
}

fn run_render(args: &RenderArgs) -> anyhow::Result<()> {
    let loaded = load(&args.source)?;

    let requesting = match &args.requesting_host {
        Some(url) => Some(
            Origin::parse(url)
                .with_context(|| format!("Invalid --requesting-host '{url}'; expected scheme://host"))?,
        ),
        None => None,
    };

    let document = restdoc::assemble(
        &loaded.settings,
        &loaded.endpoints,
        &loaded.catalog,
        requesting.as_ref(),
    )
    .context("Failed to assemble document")?;

    let bytes = if args.internal {
        match args.format {
            DocumentFormat::Json => serde_json::to_vec_pretty(document.internal())
                .context("Failed to serialize document")?,
            DocumentFormat::Yaml => serde_yaml_ng::to_string(document.internal())
                .context("Failed to serialize document")?
                .into_bytes(),
        }
    } else {
        document.render(args.format).to_vec()
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &bytes)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            eprintln!("Wrote {} document to {}", args.format, path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn run_serve(args: &ServeArgs) -> anyhow::Result<()> {
    let loaded = load(&args.source)?;
    let service = DocumentService::new(loaded.settings, loaded.endpoints, loaded.catalog)
        .context("Validation failed")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(args.addr)
            .await
            .with_context(|| format!("Failed to bind {}", args.addr))?;
        tracing::info!(addr = %args.addr, "serving /swagger.json, /swagger.yaml, /swagger/ui");

        axum::serve(listener, restdoc_server::router(service))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down");
            })
            .await
            .context("Server error")
    })
}

/// API version from `--doc-version`, else from `--cargo-toml`. `None`
/// keeps the version from the settings.
fn resolve_version(
    explicit: Option<&str>,
    cargo_toml: Option<&Path>,
) -> anyhow::Result<Option<String>> {
    match explicit {
        Some(version) => Ok(Some(version.to_string())),
        None => cargo_toml.map(read_cargo_version).transpose(),
    }
}

/// Package version from a Cargo.toml. A `[package]` that inherits its
/// version falls through to `[workspace.package]`.
fn read_cargo_version(path: &Path) -> anyhow::Result<String> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest: toml::Table =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    let package = manifest.get("package");
    let workspace_package = manifest.get("workspace").and_then(|w| w.get("package"));
    [package, workspace_package]
        .into_iter()
        .flatten()
        .find_map(|table| table.get("version").and_then(toml::Value::as_str))
        .map(str::to_string)
        .with_context(|| format!("No version found in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMOS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos");

    fn demo_source() -> SourceArgs {
        SourceArgs {
            manifest: PathBuf::from(DEMOS).join("petstore.yaml"),
            settings: Some(PathBuf::from(DEMOS).join("settings.yaml")),
            doc_version: None,
            cargo_toml: None,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("restdoc_cli_test_{name}"))
    }

    #[test]
    fn inherited_package_version_falls_through_to_workspace() {
        let path = temp_path("inherited.toml");
        fs::write(
            &path,
            "[package]\nname = \"petstore\"\nversion.workspace = true\n\n\
             [workspace.package]\nversion = \"0.5.0\"\n",
        )
        .unwrap();
        assert_eq!(read_cargo_version(&path).unwrap(), "0.5.0");
    }

    #[test]
    fn cargo_toml_version_replaces_settings_version() {
        let path = temp_path("versioned.toml");
        fs::write(&path, "[package]\nname = \"petstore\"\nversion = \"4.0.0\"\n").unwrap();
        let source = SourceArgs {
            cargo_toml: Some(path),
            ..demo_source()
        };
        let loaded = load(&source).unwrap();
        assert_eq!(loaded.settings.doc_version, "4.0.0");
        assert_eq!(loaded.endpoints.len(), 9);
    }

    #[test]
    fn unversioned_cargo_toml_fails_load() {
        let path = temp_path("unversioned.toml");
        fs::write(&path, "[package]\nname = \"petstore\"\n").unwrap();
        let source = SourceArgs {
            cargo_toml: Some(path),
            ..demo_source()
        };
        let err = load(&source).err().unwrap();
        assert!(err.to_string().contains("No version"), "{err}");
    }

    #[test]
    fn settings_version_is_kept_without_overrides() {
        assert_eq!(resolve_version(None, None).unwrap(), None);
        let loaded = load(&demo_source()).unwrap();
        assert_eq!(loaded.settings.doc_version, "1.0.0");
    }

    #[test]
    fn check_accepts_demo_manifest() {
        run_check(&CheckArgs {
            source: demo_source(),
        })
        .unwrap();
    }

    #[test]
    fn render_writes_requested_view() {
        let output = temp_path("render.json");
        run_render(&RenderArgs {
            source: SourceArgs {
                doc_version: Some("2.1.0".to_string()),
                ..demo_source()
            },
            format: DocumentFormat::Json,
            output: Some(output.clone()),
            internal: true,
            requesting_host: Some("http://localhost:7071".to_string()),
        })
        .unwrap();

        let doc: serde_json::Value =
            serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(doc["info"]["version"], "2.1.0");
        assert_eq!(doc["servers"][0]["url"], "http://localhost:7071/api");
        assert!(doc["paths"].get("/debug/snapshot").is_some());
    }

    #[test]
    fn render_rejects_relative_requesting_host() {
        let err = run_render(&RenderArgs {
            source: demo_source(),
            format: DocumentFormat::Yaml,
            output: None,
            internal: false,
            requesting_host: Some("localhost:7071".to_string()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("--requesting-host"), "{err}");
    }

    #[test]
    fn cli_parses_render() {
        let cli = Cli::try_parse_from([
            "restdoc",
            "render",
            "--manifest",
            "api.yaml",
            "--format",
            "yaml",
            "--internal",
        ])
        .unwrap();
        let Cli::Render(args) = cli else {
            panic!("expected render");
        };
        assert_eq!(args.format, DocumentFormat::Yaml);
        assert!(args.internal);
        assert_eq!(args.source.manifest, PathBuf::from("api.yaml"));
    }

    #[test]
    fn cli_rejects_both_version_sources() {
        let result = Cli::try_parse_from([
            "restdoc",
            "check",
            "--manifest",
            "api.yaml",
            "--doc-version",
            "1.0.0",
            "--cargo-toml",
            "Cargo.toml",
        ]);
        assert!(result.is_err());
    }
}
