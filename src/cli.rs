use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "fitcheck")]
#[command(author, version, about = "Size recommendations from product page size charts and selectors", long_about = None)]
#[command(after_help = r#"Examples:
  fitcheck measurements set                              Save your measurements (interactive)
  fitcheck analyze "https://www.asos.com/.../prd/123"    Recommend a size for a product
  fitcheck analyze "https://shop.example/p/1" --file page.html
  fitcheck eligible "https://www.zara.com/..."           Would this page be analysed?

Quick Start:
  1. fitcheck measurements set --bust 94cm --waist 76cm --hips 101cm --height 168cm
  2. fitcheck analyze <product url>
"#)]
pub struct Cli {
    /// Show debug logging (or set FITCHECK_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend a size for a product page
    #[command(after_help = r#"Examples:
  fitcheck analyze "https://www.asos.com/.../prd/123"
  fitcheck analyze "https://shop.example/products/jeans" --json
  fitcheck analyze "https://shop.example/products/jeans" --file saved.html --output annotated.html
  fitcheck analyze "https://shop.example/products/jeans" --no-wait
"#)]
    Analyze {
        /// Product page URL
        url: String,

        /// Read the page HTML from a file instead of fetching it
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,

        /// Write the page HTML, with the recommendation card inserted, to a file
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Skip readiness delays (the HTML is a finished snapshot)
        #[arg(long)]
        no_wait: bool,
    },

    /// Check whether a URL would be treated as a product page
    #[command(after_help = r#"Examples:
  fitcheck eligible "https://www.amazon.co.uk/dp/B0018OR118"
  fitcheck eligible "https://mail.google.com/products/1" --json
"#)]
    Eligible {
        /// Page URL
        url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage saved body measurements
    #[command(subcommand)]
    Measurements(MeasurementCommands),

    /// Generate shell completions
    #[command(after_help = r#"Examples:
  fitcheck completions bash >> ~/.bashrc
  fitcheck completions zsh >> ~/.zshrc
  fitcheck completions fish > ~/.config/fish/completions/fitcheck.fish
"#)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum MeasurementCommands {
    /// Save measurements (prompts for any that are not given)
    #[command(after_help = r#"Examples:
  fitcheck measurements set
  fitcheck measurements set --bust 37in --waist 30in --hips 40in --height 170cm
  fitcheck measurements set --gender male --bust 100 --waist 84 --hips 98 --height 182 --inseam 32in

Bare numbers below 50 are read as inches, 50 and above as centimeters.
"#)]
    Set {
        /// female or male
        #[arg(long)]
        gender: Option<String>,

        /// Bust or chest, e.g. "94cm" or "37in"
        #[arg(long)]
        bust: Option<String>,

        #[arg(long)]
        waist: Option<String>,

        #[arg(long)]
        hips: Option<String>,

        #[arg(long)]
        height: Option<String>,

        /// Inside leg; estimated from height when omitted
        #[arg(long)]
        inseam: Option<String>,
    },

    /// Show saved measurements
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete saved measurements
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}
