use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::batch::{BatchError, BatchResult};
use crate::classify::{ClassificationResult, Label};
use crate::features::FeatureKey;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with three decimals ("0.881")
pub fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

/// Label padded to the widest label, optionally colored
pub fn format_label(label: Label, use_colors: bool) -> String {
    let padded = format!("{:<9}", label.as_str());
    if !use_colors {
        return padded;
    }
    match label {
        Label::Positive => padded.green().bold().to_string(),
        Label::Uncertain => padded.yellow().to_string(),
        Label::Negative => padded.dimmed().to_string(),
    }
}

/// Format a duration in hours as "2h 15m", or "45m" under an hour
pub fn format_duration_hours(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round().max(0.0) as u64;
    let (h, m) = (total_minutes / 60, total_minutes % 60);
    if h == 0 {
        format!("{}m", m)
    } else {
        format!("{}h {:02}m", h, m)
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate an id to fit available width, accounting for Unicode
fn truncate_id(id: &str, max_width: usize) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= max_width {
        id.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn contributor_names(result: &ClassificationResult) -> String {
    if result.top_contributors.is_empty() {
        return "-".to_string();
    }
    result
        .top_contributors
        .iter()
        .map(|(feature, _)| feature.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format results as a table with columns: Index, Score, Label, Id, Contributors
/// No headers. Index column: 3 chars (fits "99."), right-aligned.
pub fn format_results_table(results: &[ClassificationResult], use_colors: bool) -> String {
    if results.is_empty() {
        return "No tracks classified.".to_string();
    }

    let term_width = get_terminal_width();

    let index_width = 3;
    let score_width = 5;
    let label_width = 9;
    let separator = "  ";

    results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_str = format_score(result.score);
            let contributors = contributor_names(result);

            // Id gets whatever the fixed columns leave over
            let fixed_width = index_width
                + 1
                + score_width
                + label_width
                + separator.len() * 3
                + contributors.chars().count();

            let id = if let Some(width) = term_width {
                if width > fixed_width + 10 {
                    truncate_id(&result.id, width - fixed_width)
                } else {
                    // Very narrow terminal, show truncated
                    truncate_id(&result.id, 20)
                }
            } else {
                // No terminal (pipe), don't truncate
                result.id.clone()
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    score_str.bold(),
                    separator,
                    format_label(result.label, true),
                    separator,
                    id,
                    separator,
                    contributors.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str,
                    score_str,
                    separator,
                    format_label(result.label, false),
                    separator,
                    id,
                    separator,
                    contributors
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format results as tab-separated values for scripting
/// Columns: score, label, id, top feature (no headers, no colors)
pub fn format_tsv(results: &[ClassificationResult]) -> String {
    results
        .iter()
        .map(|result| {
            let top = result
                .top_contributors
                .first()
                .map(|(feature, _)| feature.as_str())
                .unwrap_or("-");
            format!(
                "{}\t{}\t{}\t{}",
                format_score(result.score),
                result.label,
                result.id,
                top
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the skipped tracks, one per line, under an "Errors" heading.
/// Empty when nothing failed.
pub fn format_errors(errors: &[BatchError], use_colors: bool) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let heading = if use_colors {
        format!("{}", "Errors".red().bold())
    } else {
        "Errors".to_string()
    };

    let lines = errors.iter().map(|e| {
        if use_colors {
            format!("  {} [{}] {}", e.source.cyan(), e.kind.yellow(), e.message)
        } else {
            format!("  {} [{}] {}", e.source, e.kind, e.message)
        }
    });

    std::iter::once(heading)
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary that keeps classified and skipped tracks apart:
/// "3 classified (1 positive, 1 uncertain, 1 negative), 1 skipped"
pub fn format_summary(batch: &BatchResult) -> String {
    let counts = Label::ALL
        .iter()
        .map(|label| format!("{} {}", batch.count(*label), label))
        .collect::<Vec<_>>()
        .join(", ");

    let mut line = format!(
        "{} classified ({}), {} skipped",
        batch.results.len(),
        counts,
        batch.errors.len()
    );
    if batch.cancelled {
        line.push_str(" - cancelled before completion");
    }
    line
}

/// Multi-line breakdown of one result (for verbose mode)
pub fn format_result_detail(result: &ClassificationResult, use_colors: bool) -> String {
    let mut lines = Vec::new();

    let title = match &result.name {
        Some(name) => format!("{} ({})", result.id, name),
        None => result.id.clone(),
    };
    lines.push(if use_colors {
        format!("{}", title.bold())
    } else {
        title
    });

    lines.push(format!(
        "  Score: {}  Label: {}",
        format_score(result.score),
        format_label(result.label, use_colors).trim_end()
    ));
    lines.push(format!(
        "  Points: {}  Distance: {:.2} km  Straight line: {:.2} km",
        result.summary.point_count,
        result.summary.total_distance_km,
        result.summary.straight_line_km
    ));
    if let Some(hours) = result.features.get(FeatureKey::DurationHours).value() {
        lines.push(format!("  Duration: {}", format_duration_hours(hours)));
    }
    if let Some(gain) = result.summary.elevation_gain_m {
        lines.push(format!("  Elevation gain: {:.0} m", gain));
    }

    lines.push("  Features:".to_string());
    for (feature, value) in result.features.iter() {
        match result.breakdown.iter().find(|f| f.feature == feature) {
            Some(factor) => lines.push(format!(
                "    {:<22}{:<10}sub {:.3}  weight {:.3}  adds {:.3}",
                feature.as_str(),
                value.to_string(),
                factor.sub_score,
                factor.weight,
                factor.contribution
            )),
            None => lines.push(format!("    {:<22}{}", feature.as_str(), value)),
        }
    }

    if !result.top_contributors.is_empty() {
        lines.push("  Top contributors:".to_string());
        for (feature, contribution) in &result.top_contributors {
            lines.push(format!("    {:<22}{:.3}", feature.as_str(), contribution));
        }
    }

    lines.join("\n")
}
