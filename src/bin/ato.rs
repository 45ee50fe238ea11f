//! ATO - Adaptive Threshold Optimizer CLI
//!
//! Command-line interface for data-driven significance thresholds over
//! differential expression result tables.

use adaptive_thresholds::compare::{compare_goals, compare_methods};
use adaptive_thresholds::correct::AdjustmentMethod;
use adaptive_thresholds::data::RawTable;
use adaptive_thresholds::effect::EffectSizeMethod;
use adaptive_thresholds::error::Result;
use adaptive_thresholds::goal::AnalysisGoal;
use adaptive_thresholds::optimize::{optimize, OptimizeConfig};
use adaptive_thresholds::schema::ColumnMap;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Adaptive significance thresholds for DE result tables
#[derive(Parser)]
#[command(name = "ato")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize thresholds for one table under one goal
    Optimize {
        /// Path to the DE results table (CSV, or TSV by extension)
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis goal: discovery, balanced, or validation
        #[arg(short, long, default_value = "balanced")]
        goal: String,

        /// Effect-size method: mad, mixture, power, percentile, or auto
        #[arg(short, long, default_value = "auto")]
        effect_method: String,

        /// Override the goal's adjustment method (bh, by, qvalue, holm,
        /// hochberg, bonferroni)
        #[arg(long)]
        adjust: Option<String>,

        /// Override the goal's target level
        #[arg(long)]
        alpha: Option<f64>,

        /// Explicit effect-size column name
        #[arg(long)]
        effect_col: Option<String>,

        /// Explicit p-value column name
        #[arg(long)]
        pvalue_col: Option<String>,

        /// Write the annotated table to this CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the scalar summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Rerun under all three goals for side-by-side inspection
    CompareGoals {
        /// Path to the DE results table (CSV, or TSV by extension)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Rerun under every adjustment method at the balanced goal
    CompareMethods {
        /// Path to the DE results table (CSV, or TSV by extension)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Optimize {
            input,
            goal,
            effect_method,
            adjust,
            alpha,
            effect_col,
            pvalue_col,
            output,
            json,
        } => cmd_optimize(
            &input,
            &goal,
            &effect_method,
            adjust.as_deref(),
            alpha,
            effect_col,
            pvalue_col,
            output.as_deref(),
            json,
        ),
        Commands::CompareGoals { input } => cmd_compare_goals(&input),
        Commands::CompareMethods { input } => cmd_compare_methods(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_table(path: &Path) -> Result<RawTable> {
    eprintln!("Loading {:?}...", path);
    let table = if path.extension().is_some_and(|e| e == "tsv") {
        RawTable::from_tsv(path)?
    } else {
        RawTable::from_csv(path)?
    };
    eprintln!("Loaded {} features", table.n_features());
    Ok(table)
}

#[allow(clippy::too_many_arguments)]
fn cmd_optimize(
    input: &Path,
    goal: &str,
    effect_method: &str,
    adjust: Option<&str>,
    alpha: Option<f64>,
    effect_col: Option<String>,
    pvalue_col: Option<String>,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let table = load_table(input)?;

    let columns = if effect_col.is_some() || pvalue_col.is_some() {
        Some(ColumnMap {
            effect_size: effect_col,
            p_value: pvalue_col,
            ..ColumnMap::default()
        })
    } else {
        None
    };

    let config = OptimizeConfig {
        goal: goal.parse::<AnalysisGoal>()?,
        adjustment: adjust
            .map(|s| s.parse::<AdjustmentMethod>())
            .transpose()?,
        target_level: alpha,
        effect_method: effect_method.parse::<EffectSizeMethod>()?,
        columns,
        ..OptimizeConfig::default()
    };

    eprintln!("Optimizing thresholds ({} goal)...", config.goal);
    let result = optimize(&table, &config)?;

    if json {
        println!("{}", result.summary_json()?);
    } else {
        print!("{}", result);
        println!();
        println!("{}", result.methods_text);
    }

    if let Some(path) = output {
        result.to_csv(path)?;
        eprintln!("Annotated table written to {:?}", path);
    }

    Ok(())
}

fn cmd_compare_goals(input: &Path) -> Result<()> {
    let table = load_table(input)?;
    let results = compare_goals(&table, &AnalysisGoal::ALL, &OptimizeConfig::default())?;

    println!(
        "{:<12} {:>10} {:>8} {:>14} {:>13}",
        "goal", "adjust", "alpha", "effect_cutoff", "n_significant"
    );
    for (goal, r) in &results {
        println!(
            "{:<12} {:>10} {:>8} {:>14.4} {:>13}",
            goal.name(),
            r.adjustment_method_used.name(),
            r.target_level,
            r.effective_effect_cutoff(),
            r.n_significant
        );
    }
    Ok(())
}

fn cmd_compare_methods(input: &Path) -> Result<()> {
    let table = load_table(input)?;
    let results = compare_methods(&table, &AdjustmentMethod::ALL, &OptimizeConfig::default())?;

    println!(
        "{:<12} {:>8} {:>14} {:>13}",
        "method", "alpha", "effect_cutoff", "n_significant"
    );
    for (method, r) in &results {
        println!(
            "{:<12} {:>8} {:>14.4} {:>13}",
            method.name(),
            r.target_level,
            r.effective_effect_cutoff(),
            r.n_significant
        );
    }
    Ok(())
}
