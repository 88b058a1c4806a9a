//! BCT message dataset generator.
//!
//! Generates labeled behavioral-change messages, one CSV table per BCT
//! taxonomy code, by driving an external text-generation command with a
//! named prompt template.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bctgen::core::template::{ParsedTemplate, parse_template};
use bctgen::core::types::{CodeStatus, RunReport};
use bctgen::exit_codes;
use bctgen::io::config::{GenConfig, load_config, write_config};
use bctgen::io::generator::CommandGenerator;
use bctgen::io::layout::DatasetPaths;
use bctgen::io::taxonomy::load_taxonomy;
use bctgen::orchestrate::{RunOptions, run_generation};

const CONFIG_PATH: &str = "bctgen.toml";
const SAMPLE_TEMPLATE: &str = "\
You are a health coach writing short, supportive behavioral-change messages.
=====
Write {num_messages} distinct messages applying the behavior change technique
\"{bct_label}\", defined as: {bct_definition}
Return them as a numbered list, one message per line.
";

#[derive(Parser)]
#[command(
    name = "bctgen",
    version,
    about = "Synthetic BCT-labeled message dataset generator"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `bctgen.toml` and a sample prompt template if missing.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Parse a template and print the resulting system/user prompt pair.
    ShowPrompt {
        /// Name of the prompt template in the prompts directory.
        #[arg(short, long, default_value = "baseline")]
        prompt: String,
    },
    /// Generate `num` messages per taxonomy code and append them to the dataset.
    Generate {
        /// Name of the prompt template; also names the output directory.
        #[arg(short, long, default_value = "baseline")]
        prompt: String,
        /// Number of messages to generate for each code.
        #[arg(short = 'n', long = "num", default_value_t = 10)]
        num: u32,
        /// Continue an interrupted run, skipping codes already completed.
        #[arg(long)]
        resume: bool,
    },
}

fn main() {
    bctgen::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::ShowPrompt { prompt } => cmd_show_prompt(&prompt),
        Command::Generate {
            prompt,
            num,
            resume,
        } => cmd_generate(&prompt, num, resume),
    }
}

fn cmd_init(force: bool) -> Result<i32> {
    let config = GenConfig::default();
    let config_path = Path::new(CONFIG_PATH);
    if force || !config_path.exists() {
        write_config(config_path, &config)?;
    }

    fs::create_dir_all(&config.prompts_dir).context("create prompts directory")?;
    let sample_path = config.template_path("baseline");
    if force || !sample_path.exists() {
        fs::write(&sample_path, SAMPLE_TEMPLATE)
            .with_context(|| format!("write {}", sample_path.display()))?;
    }

    Ok(exit_codes::OK)
}

fn cmd_show_prompt(name: &str) -> Result<i32> {
    let config = load_config(Path::new(CONFIG_PATH))?;
    let template = read_template(&config, name)?;
    println!("System prompt: {}\n", template.spec.system);
    println!("User prompt: {}", template.spec.user);
    Ok(exit_codes::OK)
}

fn cmd_generate(name: &str, num: u32, resume: bool) -> Result<i32> {
    let config = load_config(Path::new(CONFIG_PATH))?;
    let template = read_template(&config, name)?;
    let taxonomy = load_taxonomy(&config.taxonomy_path)?;

    let paths = DatasetPaths::new(&config.data_dir, name);
    let generator = CommandGenerator::new(&config.generator, paths.logs_dir.clone());
    let options = RunOptions {
        dataset: name.to_string(),
        count: num,
        resume,
    };

    let report = run_generation(&config.data_dir, &generator, &template, &taxonomy, &options)?;
    print_summary(&report, &paths);

    if report.failed_codes().is_empty() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::PARTIAL)
    }
}

fn read_template(config: &GenConfig, name: &str) -> Result<ParsedTemplate> {
    let path = config.template_path(name);
    let raw =
        fs::read_to_string(&path).with_context(|| format!("read template {}", path.display()))?;
    parse_template(&raw).with_context(|| format!("parse template {}", path.display()))
}

fn print_summary(report: &RunReport, paths: &DatasetPaths) {
    let mut succeeded = 0usize;
    let mut resumed = 0usize;
    for outcome in &report.outcomes {
        match &outcome.status {
            CodeStatus::Succeeded { .. } => succeeded += 1,
            CodeStatus::AlreadyDone => resumed += 1,
            CodeStatus::Failed { error } => {
                eprintln!("[{}] failed: {}", outcome.code, error);
            }
        }
    }

    let failed = report.failed_codes();
    println!(
        "Dataset \"{}\": {} rows written ({} codes succeeded, {} already complete, {} failed)",
        report.dataset,
        report.rows_written(),
        succeeded,
        resumed,
        failed.len()
    );
    if !failed.is_empty() {
        println!("Failed codes: {}", failed.join(", "));
    }
    println!("Output saved to {}", paths.dir.display());
}
