use resale_core::{AppViewModel, GuidedPhase, PriceRange, RunView, StepStatus, StepView};

const BAR_WIDTH: usize = 24;

/// Renders the progress section: overall bar plus step list.
pub fn render_progress(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![format!(
        "Progress {} {:>3.0}%",
        bar(view.overall_progress),
        view.overall_progress * 100.0
    )];
    match (&view.combined_steps, view.requested) {
        (Some(steps), _) => lines.push(format!("  steps: {}", steps_line(steps))),
        (None, Some(mode)) => {
            let run = if mode == resale_core::RunMode::Sold {
                &view.sold
            } else {
                &view.active
            };
            lines.push(format!("  steps: {}", steps_line(&run.steps)));
        }
        (None, None) => {}
    }
    lines
}

/// Renders everything worth printing once the runs have settled.
pub fn render_results(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, run) in [("Active", &view.active), ("Sold", &view.sold)] {
        if let Some(section) = run_section(name, run) {
            lines.extend(section);
        }
    }

    if let Some(combined) = &view.combined {
        lines.push("Combined".to_string());
        if let Some(analysis) = &combined.market_analysis {
            lines.push(format!(
                "  counts: active {} / sold {} / total {}",
                analysis.active_count.unwrap_or(0),
                analysis.sold_count.unwrap_or(0),
                analysis.count.unwrap_or(0)
            ));
            lines.push(format!("  range: {}", range_line(analysis.price_range.as_ref())));
            lines.push(format!(
                "  velocity: {}  rarity: {}",
                analysis.sell_velocity.as_deref().unwrap_or("unknown"),
                analysis.rarity.as_deref().unwrap_or("unknown")
            ));
        }
        if let Some(timing) = combined.timing_sec {
            lines.push(format!("  took {timing:.1}s"));
        }
        if let Some(summary) = &combined.summary {
            lines.extend(summary.lines().map(|line| format!("  {line}")));
        }
    }
    lines
}

/// Renders the guided lookup state.
pub fn render_guided(view: &AppViewModel) -> Vec<String> {
    let guided = &view.guided;
    let mut lines = vec![format!("Identify: {}", phase_label(guided.phase))];
    if let Some(error) = &guided.error {
        lines.push(format!("  ! {error}"));
    }
    for (index, candidate) in guided.candidates.iter().enumerate() {
        let marker = if guided.selected_id.as_deref() == Some(candidate.id.as_str()) {
            '*'
        } else {
            ' '
        };
        lines.push(format!("  {marker}[{index}] {}", candidate.title));
    }
    if !guided.title_draft.is_empty() {
        let edited = if guided.title_edited { " (edited)" } else { "" };
        lines.push(format!("  title: {}{edited}", guided.title_draft));
    }
    lines
}

fn run_section(name: &str, run: &RunView) -> Option<Vec<String>> {
    if !run.has_result && run.error.is_none() {
        return None;
    }
    let mut lines = vec![format!("{name} listings")];
    if let Some(error) = &run.error {
        lines.push(format!("  ! {error}"));
    }
    if run.has_result {
        lines.push(format!(
            "  {} priced of {} shown, range: {}",
            run.visible_priced,
            run.listings.len(),
            range_line(run.price_range.as_ref())
        ));
        for row in run.listings.iter().take(10) {
            let price = row.price_text.as_deref().unwrap_or("n/a");
            lines.push(format!("  - {price:>10}  {}", row.title));
        }
    }
    Some(lines)
}

fn range_line(range: Option<&PriceRange>) -> String {
    match range {
        None => "insufficient data".to_string(),
        Some(range) => {
            let quartiles = match (range.q1, range.q3) {
                (Some(q1), Some(q3)) => format!(" q1 {q1:.2} q3 {q3:.2}"),
                _ => String::new(),
            };
            format!(
                "{:.2}..{:.2} median {:.2}{quartiles} (n={})",
                range.low, range.high, range.median, range.n
            )
        }
    }
}

fn steps_line(steps: &[StepView]) -> String {
    steps
        .iter()
        .map(|step| {
            let mark = match step.status {
                StepStatus::Done => "✓",
                StepStatus::Active => "…",
                StepStatus::Pending => "·",
            };
            format!("{mark} {}", step.label)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn bar(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn phase_label(phase: GuidedPhase) -> &'static str {
    match phase {
        GuidedPhase::Inputs => "waiting for input",
        GuidedPhase::Identifying => "looking up matches",
        GuidedPhase::PickMatch => "pick a match",
        GuidedPhase::ReadyToAnalyze => "ready",
        GuidedPhase::Analyzing => "analyzing",
        GuidedPhase::Done => "done",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_clamped_and_fixed_width() {
        assert_eq!(bar(0.0), format!("[{}]", "-".repeat(BAR_WIDTH)));
        assert_eq!(bar(2.0), format!("[{}]", "#".repeat(BAR_WIDTH)));
        assert_eq!(bar(0.5).len(), BAR_WIDTH + 2);
    }

    #[test]
    fn empty_range_reads_as_insufficient_data() {
        assert_eq!(range_line(None), "insufficient data");
    }
}
