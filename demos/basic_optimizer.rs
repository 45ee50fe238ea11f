//! Basic example demonstrating adaptive threshold optimization.
//!
//! This example shows how to:
//! 1. Create a synthetic DE results table
//! 2. Optimize thresholds under the balanced goal
//! 3. Examine the annotated results
//! 4. Compare all three analysis goals

use adaptive_thresholds::prelude::*;

fn main() -> Result<()> {
    println!("=== Adaptive Threshold Optimizer Example ===\n");

    let table = create_example_table();
    println!("Features: {}\n", table.n_features());

    // Optimize under the balanced goal
    println!("=== Balanced Optimization ===\n");
    let result = optimize(&table, &OptimizeConfig::default())?;
    print!("{}", result);
    println!();
    println!("{}\n", result.methods_text);

    // Top significant features
    let mut significant = result.significant_genes();
    significant.sort_by(|a, b| {
        a.adjusted_p_value
            .partial_cmp(&b.adjusted_p_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!("=== Top 10 Significant Features ===\n");
    println!(
        "{:<12} {:>10} {:>12} {:>12}",
        "Feature", "Effect", "p-value", "adj.p"
    );
    println!("{}", "-".repeat(50));
    for f in significant.iter().take(10) {
        println!(
            "{:<12} {:>10.4} {:>12.2e} {:>12.2e}",
            f.feature_id,
            f.effect_size.unwrap_or(f64::NAN),
            f.p_value.unwrap_or(f64::NAN),
            f.adjusted_p_value.unwrap_or(f64::NAN)
        );
    }

    // Compare goals
    println!("\n=== Goal Comparison ===\n");
    let comparison = compare_goals(&table, &AnalysisGoal::ALL, &OptimizeConfig::default())?;
    println!(
        "{:<12} {:>10} {:>8} {:>14} {:>13}",
        "goal", "adjust", "alpha", "effect_cutoff", "n_significant"
    );
    for (goal, r) in &comparison {
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

/// Create a synthetic DE table with 10% differential features.
fn create_example_table() -> RawTable {
    let n_features = 2000;
    let n_de = 200;
    let mut seed = 12345u64;

    let rand_uniform = |s: &mut u64| -> f64 {
        *s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (((*s >> 33) & 0x7FFF_FFFF) as f64 + 0.5) / 0x8000_0000u64 as f64
    };
    let rand_normal = |s: &mut u64| -> f64 {
        let mut total = 0.0;
        for _ in 0..12 {
            total += rand_uniform(s);
        }
        total - 6.0
    };

    let mut effect = Vec::with_capacity(n_features);
    let mut p = Vec::with_capacity(n_features);
    for i in 0..n_features {
        if i < n_de {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            effect.push(Some(sign * (1.5 + 0.5 * rand_normal(&mut seed))));
            p.push(Some(
                (-0.001 * rand_uniform(&mut seed).ln()).clamp(1e-300, 0.05),
            ));
        } else {
            effect.push(Some(0.2 * rand_normal(&mut seed)));
            p.push(Some(0.05 + 0.95 * rand_uniform(&mut seed)));
        }
    }

    RawTable::new(
        (0..n_features).map(|i| format!("Gene_{}", i)).collect(),
        vec![
            ("log2FoldChange".to_string(), Column::Numeric(effect)),
            ("pvalue".to_string(), Column::Numeric(p)),
        ],
    )
    .unwrap()
}
