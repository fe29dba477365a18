use colored::{ColoredString, Colorize};
use pandemic_game::{Band, BoardSummary, GameSession, LocationReport, RiskTier};

const MIN_COLUMN_WIDTH: usize = 18;

fn paint(text: &str, tier: RiskTier) -> ColoredString {
    match tier {
        RiskTier::Safe => text.green().on_black(),
        RiskTier::Caution => text.yellow().on_black(),
        RiskTier::Critical => text.black().on_red().bold(),
    }
}

fn cell_text(report: &LocationReport) -> String {
    let mut text = format!("{} {:.2}", report.name, report.probability);
    if report.infection_level > 0 {
        text.push_str(&format!(" [{}]", report.infection_level));
    }
    if report.quarantined {
        text.push_str(" Q");
    }
    if report.can_outbreak {
        text.push('!');
    }
    text
}

/// Striation bands as side-by-side columns, most recent on the left.
pub fn render_board(bands: &[Band]) -> Vec<String> {
    if bands.is_empty() {
        return vec!["(no cards tracked)".to_string()];
    }
    let columns: Vec<(String, Vec<(String, RiskTier)>)> = bands
        .iter()
        .map(|band| {
            let cells = band
                .members
                .iter()
                .map(|r| (cell_text(r), r.tier))
                .collect();
            (format!("{} ({})", band.label(), band.members.len()), cells)
        })
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .map(|(title, cells)| {
            cells
                .iter()
                .map(|(text, _)| text.chars().count())
                .chain(std::iter::once(title.chars().count()))
                .max()
                .unwrap_or(0)
                .max(MIN_COLUMN_WIDTH)
        })
        .collect();
    let rows = columns.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);

    let mut lines = Vec::with_capacity(rows + 2);
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|((title, _), width)| format!("{title:<width$}").bold().to_string())
        .collect();
    lines.push(header.join("  "));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in 0..rows {
        let cells: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|((_, cells), width)| match cells.get(row) {
                Some((text, tier)) => paint(&format!("{text:<width$}"), *tier).to_string(),
                None => " ".repeat(*width),
            })
            .collect();
        lines.push(cells.join("  ").trim_end().to_string());
    }
    lines
}

pub fn render_summary(summary: &BoardSummary) -> String {
    format!(
        "{}  rate {}  outbreaks {}  dealt {}  epidemics {}/{}  P(epidemic) {:.2}  avg band {:.1}",
        summary.game_name.bold(),
        summary.infection_rate,
        summary.outbreaks,
        summary.cards_dealt,
        summary.shock_markers_drawn,
        summary.shock_markers_total,
        summary.shock_probability,
        summary.mean_striation_size
    )
}

pub fn render_session(session: &GameSession) -> String {
    let mut out = render_summary(&session.summary());
    out.push('\n');
    out.push_str(&render_board(&session.board()).join("\n"));
    out
}
