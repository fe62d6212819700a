//! Human-readable rendering of a production plan

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use crate::planner::PlanOutcome;

/// Render a duration like `3:05:00`, or `2 days, 1:00:00` past a day
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let clock = format!("{}:{:02}:{:02}", hours, minutes, seconds);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

fn join_amounts<'a>(amounts: impl Iterator<Item = (&'a String, &'a u64)>) -> String {
    amounts
        .map(|(ticker, amount)| format!("{}:{}", ticker, amount))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A finished plan together with what was asked for
#[derive(Debug)]
pub struct PlanSummary<'a> {
    pub targets: &'a [(String, u64)],
    pub outcome: &'a PlanOutcome,
    pub raw_resources: &'a HashSet<String>,
}

impl fmt::Display for PlanSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Plan ===")?;
        let targets: Vec<String> = self
            .targets
            .iter()
            .map(|(ticker, quantity)| format!("{} x{}", ticker, quantity))
            .collect();
        writeln!(f, "Target: {}", targets.join(", "))?;

        let plan = &self.outcome.plan;
        if plan.is_empty() {
            writeln!(f)?;
            writeln!(f, "Nothing to produce.")?;
        }

        for (building, building_plan) in plan.buildings() {
            writeln!(f)?;
            writeln!(
                f,
                "{} - Total Active Time: {}",
                building,
                format_duration(building_plan.total_time)
            )?;
            for (name, totals) in &building_plan.recipes {
                writeln!(
                    f,
                    "  {}  runs: {}  time: {}",
                    name,
                    totals.runs,
                    format_duration(totals.time)
                )?;
                writeln!(f, "    in:  {}", join_amounts(totals.inputs.iter()))?;
                writeln!(f, "    out: {}", join_amounts(totals.outputs.iter()))?;
            }
        }

        let needed = &self.outcome.materials_needed;
        writeln!(f)?;
        writeln!(f, "Raw materials required:")?;
        for (ticker, amount) in needed.iter().filter(|(t, _)| self.raw_resources.contains(*t)) {
            writeln!(f, "  {} x{}", ticker, amount)?;
        }

        writeln!(f)?;
        writeln!(f, "Materials needed (gross):")?;
        for (ticker, amount) in needed.iter() {
            writeln!(f, "  {} x{}", ticker, amount)?;
        }

        let surplus: Vec<_> = self.outcome.inventory.surplus().collect();
        if !surplus.is_empty() {
            writeln!(f)?;
            writeln!(f, "Leftover surplus:")?;
            for (ticker, amount) in surplus {
                writeln!(f, "  {} x{}", ticker, amount)?;
            }
        }

        Ok(())
    }
}
