//! chronicler CLI: incremental narrative knowledge-base builder.

use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use miette::Result;

use chronicler::diff;
use chronicler::oracle::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN, HttpOracle, OracleConfig, RequestParams,
};
use chronicler::pipeline;

#[derive(Parser)]
#[command(
    name = "chronicler",
    version,
    about = "Incremental chapter-by-chapter knowledge base builder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one chapter: filter the KB, query the oracle, merge the reply.
    Run {
        /// Chapter text file.
        chapter_file: PathBuf,

        /// Knowledge base JSON from a prior run (use a file containing `{}` to start fresh).
        knowledge_base: PathBuf,

        /// Directory for this run's artifacts (created if missing).
        output_dir: PathBuf,

        /// Chat-completions endpoint URL.
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Model identifier passed to the endpoint.
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        /// Bearer token for the endpoint.
        #[arg(long, default_value = DEFAULT_TOKEN)]
        token: String,

        /// Completion budget in tokens.
        #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
        max_tokens: u32,

        /// Sampling temperature.
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,

        /// Whole-request timeout in seconds.
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,
    },

    /// Compare the entity sets of two extraction outputs.
    Diff {
        /// First `parsed_output.json`.
        extraction_a: PathBuf,

        /// Second `parsed_output.json`.
        extraction_b: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Usage mistakes exit 1, matching every other failure mode of a run;
    // --help and --version keep clap's normal exit status.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Run {
            chapter_file,
            knowledge_base,
            output_dir,
            endpoint,
            model,
            token,
            max_tokens,
            temperature,
            timeout_secs,
        } => {
            let oracle = HttpOracle::new(OracleConfig {
                endpoint,
                model,
                token,
                timeout: Duration::from_secs(timeout_secs),
            });
            let params = RequestParams {
                max_tokens,
                temperature,
            };

            let summary = pipeline::run_chapter(
                &oracle,
                params,
                &chapter_file,
                &knowledge_base,
                &output_dir,
            )?;

            println!(
                "Chapter {}: matched {} known entities, merged {} records.",
                summary.chapter, summary.matched, summary.extracted
            );
            println!("All outputs saved to '{}'.", output_dir.display());
        }

        Commands::Diff {
            extraction_a,
            extraction_b,
        } => {
            let a = diff::load_entity_names(&extraction_a)?;
            let b = diff::load_entity_names(&extraction_b)?;
            let result = diff::diff(&a, &b);

            println!("Missing in {}:", extraction_a.display());
            for name in &result.only_in_b {
                println!("\t{name}");
            }
            println!();
            println!("Missing in {}:", extraction_b.display());
            for name in &result.only_in_a {
                println!("\t{name}");
            }
            println!();
            println!("Intersection:");
            for name in &result.both {
                println!("\t{name}");
            }
        }
    }

    Ok(())
}
