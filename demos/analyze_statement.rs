use statement_ratio_analyzer::{
    format_percent, format_thousands, AnchorLabels, ContainsLabelMatcher, LiquidityDisplay,
    NarrativeRequestBuilder, RatioEngine,
};
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: analyze_statement <statement.csv|statement.xlsx>")?;

    let table = statement_ratio_analyzer::load_statement(&path)?;
    println!("📄 Loaded {} rows from {}\n", table.len(), path.display());

    let engine = RatioEngine::with_matcher(ContainsLabelMatcher::new(AnchorLabels::bilingual()));
    let analysis = engine.analyze(&table);

    println!("📊 Growth & asset composition");
    println!(
        "{:<40} {:>16} {:>16} {:>12} {:>12} {:>12}",
        analysis.headers.label,
        analysis.headers.prior,
        analysis.headers.current,
        "Growth",
        "Prior share",
        "Curr. share"
    );
    for row in &analysis.rows {
        println!(
            "{:<40} {:>16} {:>16} {:>12} {:>12} {:>12}",
            row.label,
            format_thousands(row.prior),
            format_thousands(row.current),
            format_percent(row.growth_pct),
            format_percent(row.prior_share_pct),
            format_percent(row.current_share_pct)
        );
    }

    let liquidity = LiquidityDisplay::from(&analysis.liquidity);
    println!("\n💧 Current ratio");
    println!("  Prior period:   {} times", liquidity.prior);
    match &liquidity.delta {
        Some(delta) => println!("  Current period: {} times ({})", liquidity.current, delta),
        None => println!("  Current period: {} times", liquidity.current),
    }

    for warning in &analysis.warnings {
        println!("⚠️  {}", warning);
    }

    println!("\n🤖 Advisory payload\n------------------------------------------------------------------");
    println!("{}", NarrativeRequestBuilder::new(&analysis).build());

    Ok(())
}
