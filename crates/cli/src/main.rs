//! CLI tool for generating slide decks from free-form text.

mod pipeline;
mod template_store;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pipeline::Pipeline;
use slidegen_pptx::{DeckArtifact, OutputTarget};
use slidegen_provider::{create_provider, ProviderKind, ProviderSettings};
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use template_store::TemplateStore;

/// Output value that sends base64 to stdout.
const STDOUT_OUTPUT: &str = "-";

/// Generate PowerPoint decks from text with a language model.
#[derive(Parser, Debug)]
#[command(name = "slidegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding template configurations
    #[arg(
        long,
        global = true,
        env = "SLIDEGEN_TEMPLATES_DIR",
        default_value = "content_templates"
    )]
    templates_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a deck from input text
    Generate(GenerateArgs),
    /// List available templates
    Templates,
    /// List supported providers
    Models,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Input text file ('-' or omitted for stdin)
    input: Option<PathBuf>,

    /// Template name or path to a template JSON file
    #[arg(short, long, default_value = "academic")]
    template: String,

    /// Provider to use (openai, ollama, lmstudio)
    #[arg(short, long, default_value = "openai")]
    provider: ProviderKind,

    /// API key for the provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the provider API
    #[arg(long, env = "SLIDEGEN_BASE_URL")]
    base_url: Option<String>,

    /// Model name (default depends on the provider)
    #[arg(short, long, env = "SLIDEGEN_MODEL")]
    model: Option<String>,

    /// Deck title, overriding the one the model suggests
    #[arg(long)]
    title: Option<String>,

    /// Output .pptx path, or '-' for base64 on stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Directory for generated decks when no output path is given
    #[arg(long, env = "SLIDEGEN_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let store = TemplateStore::new(&cli.templates_dir);

    match &cli.command {
        Command::Generate(args) => generate(args, &store, cli.verbose).await,
        Command::Templates => list_templates(&store),
        Command::Models => {
            list_models();
            Ok(())
        }
    }
}

/// Run the whole pipeline for one input.
async fn generate(args: &GenerateArgs, store: &TemplateStore, verbose: bool) -> Result<()> {
    let input_text = read_input(args.input.as_deref())?;
    if input_text.trim().is_empty() {
        bail!("Input text is empty");
    }
    if verbose {
        eprintln!("Read {} characters", input_text.chars().count());
    }

    let template = store
        .load(&args.template)
        .with_context(|| format!("Failed to load template '{}'", args.template))?;

    let provider = create_provider(provider_settings(args))
        .with_context(|| format!("Failed to initialize {} provider", args.provider))?;
    if verbose {
        eprintln!("Using {} ({})", provider.kind(), provider.model());
    }

    let generated = Pipeline::new(provider.as_ref())
        .run(
            &template.config,
            &template.deck,
            &input_text,
            args.title.as_deref(),
        )
        .await
        .context("Failed to generate presentation")?;

    if verbose {
        eprintln!(
            "Generated '{}' with {} slides",
            generated.deck_title,
            generated.outline.slide_count()
        );
    }

    let target = output_target(args.output.as_deref(), &args.output_dir);
    match generated
        .deck
        .into_artifact(target)
        .context("Failed to write presentation")?
    {
        DeckArtifact::File(path) => eprintln!("Presentation saved to {}", path.display()),
        DeckArtifact::Encoded { base64, .. } => {
            println!("{}", base64);
            if verbose {
                eprintln!("Base64 output complete ({} characters)", base64.len());
            }
        }
    }

    Ok(())
}

/// Read input from a file, or from stdin for `-` or no path.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new(STDOUT_OUTPUT) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        _ => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                eprintln!("Reading from stdin (press Ctrl+D to finish):");
            }
            let mut text = String::new();
            stdin
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn provider_settings(args: &GenerateArgs) -> ProviderSettings {
    let mut settings = ProviderSettings::new(args.provider);
    if let Some(url) = &args.base_url {
        settings = settings.with_base_url(url.as_str());
    }
    if let Some(key) = &args.api_key {
        settings = settings.with_api_key(key.as_str());
    }
    if let Some(model) = &args.model {
        settings = settings.with_model(model.as_str());
    }
    settings
}

/// Where the finished deck goes.
fn output_target(output: Option<&str>, output_dir: &Path) -> OutputTarget {
    match output {
        Some(STDOUT_OUTPUT) => OutputTarget::Encoded,
        Some(path) => OutputTarget::File(PathBuf::from(path)),
        None => OutputTarget::Directory(output_dir.to_path_buf()),
    }
}

fn list_templates(store: &TemplateStore) -> Result<()> {
    let templates = store.list().context("Failed to list templates")?;
    if templates.is_empty() {
        println!("No templates found");
        return Ok(());
    }

    println!("Available templates:");
    for template in templates {
        if template.description.is_empty() {
            println!("  {:<12} {}", template.name, template.display_name);
        } else {
            println!(
                "  {:<12} {} - {}",
                template.name, template.display_name, template.description
            );
        }
    }
    Ok(())
}

fn list_models() {
    let api_key = std::env::var("OPENAI_API_KEY").ok();

    println!("Supported providers:");
    for kind in ProviderKind::ALL {
        let status = if kind.available(api_key.as_deref()) {
            "available"
        } else {
            "needs OPENAI_API_KEY"
        };
        println!(
            "  {:<10} {} [{}, default model {}]",
            kind.name(),
            kind.description(),
            status,
            kind.default_model()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_target() {
        let dir = Path::new("outputs");
        assert_eq!(output_target(Some("-"), dir), OutputTarget::Encoded);
        assert_eq!(
            output_target(Some("deck.pptx"), dir),
            OutputTarget::File(PathBuf::from("deck.pptx"))
        );
        assert_eq!(
            output_target(None, dir),
            OutputTarget::Directory(PathBuf::from("outputs"))
        );
    }

    #[test]
    fn test_generate_args_parse() {
        let cli = Cli::try_parse_from([
            "slidegen",
            "generate",
            "notes.txt",
            "--provider",
            "ollama",
            "--model",
            "llama3",
            "--title",
            "Tides",
            "-o",
            "-",
        ])
        .unwrap();

        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.input, Some(PathBuf::from("notes.txt")));
        assert_eq!(args.provider, ProviderKind::Ollama);
        assert_eq!(args.template, "academic");
        assert_eq!(args.output.as_deref(), Some("-"));

        let settings = provider_settings(&args);
        assert_eq!(settings.kind, ProviderKind::Ollama);
        assert_eq!(settings.model, "llama3");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = Cli::try_parse_from(["slidegen", "generate", "--provider", "bard"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "Ocean tides").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "Ocean tides");
        assert!(read_input(Some(&dir.path().join("missing.txt"))).is_err());
    }
}
