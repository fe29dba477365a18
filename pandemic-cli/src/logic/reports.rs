use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::SimulationResult;

pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[SimulationResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Simulation Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Seeds run: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} seed {}", status, result.seed.to_string().bold())?;
        writeln!(
            out,
            "   {} steps: {} infections, {} epidemics, {} quarantines, {} deals, {} rejected",
            result.steps,
            result.infections,
            result.shocks,
            result.quarantines,
            result.deals,
            result.rejected
        )?;
        writeln!(
            out,
            "   outbreaks {}  bands {}  peak P {:.2}  next epidemic P {:.2}",
            result.outbreaks,
            result.striations,
            result.peak_probability,
            result.final_shock_probability
        )?;
        for violation in &result.violations {
            writeln!(out, "     • {}", violation.red())?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(out: &mut W, results: &[SimulationResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}
