use crate::cli::{BatchArgs, RatesArgs, ScoreArgs, SummaryArgs};
use crate::infra::{bootstrap, default_output_path, read_record};
use admission_risk::error::AppError;
use admission_risk::scoring::{ApplicantProfile, DatasetSummary, HistoricalRateIndex};
use serde::Serialize;
use tracing::info;

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let engine = bootstrap(&args.engine)?;
    let record = read_record(&args.record)?;
    let profile = engine.profile(&record)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        render_profile(&profile);
    }
    Ok(())
}

pub(crate) async fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let engine = bootstrap(&args.engine)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    let handle = engine.submit_batch(&args.input)?;
    println!("Submitted {} for {}", handle.job_id(), args.input.display());

    let table = handle.wait().await?;
    table.write_csv(&output)?;
    info!(rows = table.len(), output = %output.display(), "scored upload written");

    println!(
        "- {} applicants scored | {} predicted APROBADO | {} predicted NO APROBADO",
        table.len(),
        table.approved(),
        table.len() - table.approved()
    );
    println!("- Results written to {}", output.display());
    Ok(())
}

pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let engine = bootstrap(&args.engine)?;
    let summary = engine.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        render_summary(&summary);
    }
    Ok(())
}

#[derive(Serialize)]
struct RateRow<'a> {
    institution: &'a str,
    rate: f64,
}

pub(crate) fn run_rates(args: RatesArgs) -> Result<(), AppError> {
    let engine = bootstrap(&args.engine)?;
    let index = engine.rate_index();

    if let Some(issue) = engine.rate_index_issue() {
        eprintln!("warning: {issue}; every institution reports 0.0");
    }

    let rows = matching_rates(index, args.filter.as_deref());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Historical approval rate by institution ({} shown)", rows.len());
    for row in &rows {
        println!(
            "  - {}: {:.1}% (percentile {:.1})",
            row.institution,
            row.rate * 100.0,
            index.percentile_of(row.rate)
        );
    }
    if let Some(mean) = index.mean_rate() {
        println!("Mean across {} institutions: {:.1}%", index.len(), mean * 100.0);
    }
    Ok(())
}

fn matching_rates<'a>(index: &'a HistoricalRateIndex, filter: Option<&str>) -> Vec<RateRow<'a>> {
    let needle = filter.map(str::to_uppercase);
    index
        .rates()
        .filter(|(institution, _)| match &needle {
            Some(needle) => institution.to_uppercase().contains(needle.as_str()),
            None => true,
        })
        .map(|(institution, rate)| RateRow { institution, rate })
        .collect()
}

fn render_profile(profile: &ApplicantProfile) {
    let comparison = &profile.comparison;

    println!("Applicant evaluation");
    println!(
        "- Prediction: {} ({:.1}% approval probability)",
        profile.prediction.label.output_label(),
        profile.prediction.probability * 100.0
    );
    println!(
        "- Risk: {} tier | {}",
        comparison.risk_tier.label(),
        comparison.risk_status.label()
    );
    println!(
        "- Institution approval rate: {:.1}% (percentile {:.1})",
        comparison.institution_rate * 100.0,
        comparison.percentile
    );

    println!("Comparison with historical applicants:");
    for feature in &comparison.comparisons {
        match (feature.historical_mean, feature.difference()) {
            (Some(mean), Some(difference)) => println!(
                "  - {}: {:.2} vs mean {:.2} ({:+.2})",
                feature.column, feature.applicant_value, mean, difference
            ),
            _ => println!(
                "  - {}: {:.2} (no historical values)",
                feature.column, feature.applicant_value
            ),
        }
    }
}

fn render_summary(summary: &DatasetSummary) {
    println!(
        "Historical dataset: {} rows, {} columns",
        summary.rows,
        summary.columns.len()
    );
    for column in &summary.columns {
        println!(
            "  - {} [{:?}] {} present | {} missing ({:.2}%)",
            column.name, column.kind, column.non_null, column.nulls, column.null_pct
        );
        if let Some(stats) = &column.numeric {
            let std_dev = stats
                .std_dev
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "      mean {:.2} | std {} | min {:.2} | max {:.2}",
                stats.mean, std_dev, stats.min, stats.max
            );
        }
    }
}
