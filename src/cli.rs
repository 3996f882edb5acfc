// ============================================================================
// PixelPost CLI — headless draft export and publishing
// ============================================================================
//
// Usage examples:
//   pixelpost --input cat.pxd --output cat.png
//   pixelpost -i drafts/*.pxd --output-dir exported/ --scale 8
//   pixelpost -i cat.pxd --publish --server http://localhost:8080/api --token <jwt>
//
// No window is opened in CLI mode.  All processing runs synchronously on the
// current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::api::{ApiClient, PostPayload};
use crate::io::{DEFAULT_EXPORT_SCALE, export_png, load_draft};
use crate::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// PixelPost headless draft processor.
///
/// Export `.pxd` drafts to PNG or publish them to the sharing backend — no
/// GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "pixelpost",
    about = "PixelPost headless draft exporter and publisher",
    long_about = "Export PixelPost .pxd drafts to PNG images or publish them to the\n\
                  sharing server without opening the editor.\n\n\
                  Example:\n  \
                  pixelpost --input cat.pxd --output cat.png --scale 16\n  \
                  pixelpost -i drafts/*.pxd --output-dir exported/\n  \
                  pixelpost -i cat.pxd --publish --token <jwt>"
)]
pub struct CliArgs {
    /// Input draft file(s). Glob patterns accepted (e.g. "drafts/*.pxd").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output PNG path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch export.
    /// Files are written here with the draft's stem and a .png extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Exported pixels per canvas cell (a 32×32 draft at scale 16 → 512×512).
    #[arg(long, default_value_t = DEFAULT_EXPORT_SCALE, value_name = "1-128")]
    pub scale: u32,

    /// Publish each draft to the sharing server instead of exporting PNGs.
    #[arg(long)]
    pub publish: bool,

    /// Server base URL. Defaults to the saved settings, then the dev server.
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Bearer token for --publish. Defaults to the saved login.
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process
    /// arguments.  Used by `main()` to route before creating a window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all drafts succeeded, `1` = one or more failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch export.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    // Fall back to saved settings for server and token.
    let settings = AppSettings::load();
    let server = args.server.clone().unwrap_or(settings.server_url);
    let token = args
        .token
        .clone()
        .or(Some(settings.auth_token))
        .filter(|t| !t.is_empty());

    let client = if args.publish {
        match ApiClient::new(&server, token) {
            Ok(c) => Some(c),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let outcome = if let Some(client) = &client {
            publish_one(input_path, client)
        } else {
            export_one(input_path, &args)
        };

        match outcome {
            Ok(done) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        done,
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file pipelines
// ============================================================================

fn export_one(input: &Path, args: &CliArgs) -> Result<String, String> {
    let (canvas, _caption) = load_draft(input)?;
    let output = build_output_path(input, args.output.as_deref(), args.output_dir.as_deref())
        .ok_or_else(|| format!("cannot determine output path for '{}'", input.display()))?;
    export_png(&canvas, &output, args.scale.clamp(1, 128))?;
    Ok(output.display().to_string())
}

fn publish_one(input: &Path, client: &ApiClient) -> Result<String, String> {
    let (canvas, caption) = load_draft(input)?;

    // Same validation the editor applies before any network call.
    if !canvas.has_content() {
        return Err("canvas is empty, nothing to publish".to_string());
    }
    let title = caption.trim().to_string();
    if title.is_empty() {
        return Err("draft has no description; set one in the editor first".to_string());
    }

    client.submit_post(&PostPayload {
        title,
        pixel_data: canvas.snapshot(),
    })?;
    Ok("published".to_string())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the PNG output path for a single draft.
///
/// Priority:
/// 1. `--output` (explicit path, single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: next to the input with a `.png` extension
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();
    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.png", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}.png", stem)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_priority() {
        let input = Path::new("drafts/cat.pxd");
        assert_eq!(
            build_output_path(input, Some(Path::new("art.png")), None),
            Some(PathBuf::from("art.png"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out"))),
            Some(PathBuf::from("out/cat.png"))
        );
        assert_eq!(
            build_output_path(input, None, None),
            Some(PathBuf::from("drafts/cat.png"))
        );
    }

    #[test]
    fn test_resolve_inputs_keeps_literal_paths_once() {
        let tmp = std::env::temp_dir().join(format!("pixelpost_cli_{}.pxd", std::process::id()));
        std::fs::write(&tmp, b"x").unwrap();
        let pattern = tmp.to_string_lossy().into_owned();
        let inputs = resolve_inputs(&[pattern.clone(), pattern]);
        let _ = std::fs::remove_file(&tmp);
        assert_eq!(inputs.len(), 1);
    }

    #[test]
    fn test_resolve_inputs_empty_for_unmatched_pattern() {
        let inputs = resolve_inputs(&["/nonexistent_dir_pixelpost/*.pxd".to_string()]);
        assert!(inputs.is_empty());
    }

    #[test]
    fn test_publish_rejects_blank_draft_before_any_request() {
        use crate::canvas::PixelColor;
        use crate::project::Draft;

        let draft = Draft::new_untitled(1, 4, PixelColor::WHITE);
        let path = std::env::temp_dir()
            .join(format!("pixelpost_cli_blank_{}.pxd", std::process::id()));
        crate::io::save_draft(&draft, &path).unwrap();

        // The address is unroutable; validation must fail first, so no
        // network error can appear in the message.
        let client = ApiClient::new("http://0.0.0.0:0/api", None).unwrap();
        let err = publish_one(&path, &client).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(err.contains("empty"), "got: {}", err);
    }
}
