use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use kestrel::{
    core::{
        CostSummary,
        DailyCost,
        Recommendation,
        SimulationStep,
        SystemFlow,
        TimeStep,
    },
    quantity::{cost::Cost, energy::KilowattHours},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn energy_cell(energy: KilowattHours, color: Color) -> Cell {
    let cell = Cell::new(energy).set_alignment(CellAlignment::Right);
    if energy > KilowattHours::EPSILON { cell.fg(color) } else { cell.add_attribute(Attribute::Dim) }
}

fn cost_cell(cost: Cost) -> Cell {
    Cell::new(cost).set_alignment(CellAlignment::Right).fg(if cost >= Cost::ONE_CENT {
        Color::Red
    } else if cost <= -Cost::ONE_CENT {
        Color::Green
    } else {
        Color::Reset
    })
}

pub fn build_simulation_table(series: &[TimeStep], steps: &[SimulationStep]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Date",
        "Time",
        "PV",
        "Load",
        "Charge",
        "Discharge",
        "Residual",
        "Import",
        "Export",
    ]);
    for (time_step, step) in series.iter().zip(steps) {
        table.add_row(vec![
            Cell::new(step.timestamp.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(step.timestamp.format("%H:%M")),
            energy_cell(time_step.production, Color::DarkYellow),
            energy_cell(time_step.consumption, Color::Reset),
            energy_cell(step.charge(), Color::Green),
            energy_cell(step.discharge(), Color::Blue),
            Cell::new(step.residual_energy).set_alignment(CellAlignment::Right),
            energy_cell(step.grid_flow().import, Color::Red),
            energy_cell(step.grid_flow().export, Color::Cyan),
        ]);
    }
    let total: SystemFlow<KilowattHours> = steps.iter().map(|step| step.flow).sum();
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(series.iter().map(|step| step.production).sum::<KilowattHours>())
            .set_alignment(CellAlignment::Right),
        Cell::new(series.iter().map(|step| step.consumption).sum::<KilowattHours>())
            .set_alignment(CellAlignment::Right),
        Cell::new(total.battery.import).set_alignment(CellAlignment::Right),
        Cell::new(total.battery.export).set_alignment(CellAlignment::Right),
        Cell::new(""),
        Cell::new(total.grid.import).set_alignment(CellAlignment::Right),
        Cell::new(total.grid.export).set_alignment(CellAlignment::Right),
    ]);
    table
}

pub fn build_comparison_table(summary: &CostSummary) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Scenario", "Import", "Export", "Import cost", "Export revenue", "Net"]);
    table.add_row(vec![
        Cell::new("Baseline"),
        Cell::new(summary.baseline_import).set_alignment(CellAlignment::Right),
        Cell::new(summary.baseline_export).set_alignment(CellAlignment::Right),
        Cell::new(summary.baseline_import_cost).set_alignment(CellAlignment::Right),
        Cell::new(summary.baseline_export_revenue).set_alignment(CellAlignment::Right),
        cost_cell(summary.baseline_cost),
    ]);
    table.add_row(vec![
        Cell::new("Battery"),
        Cell::new(summary.optimized_import).set_alignment(CellAlignment::Right),
        Cell::new(summary.optimized_export).set_alignment(CellAlignment::Right),
        Cell::new(summary.optimized_import_cost).set_alignment(CellAlignment::Right),
        Cell::new(summary.optimized_export_revenue).set_alignment(CellAlignment::Right),
        cost_cell(summary.optimized_cost),
    ]);
    table.add_row(vec![
        Cell::new("Savings").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(summary.savings)
            .set_alignment(CellAlignment::Right)
            .fg(if summary.savings >= Cost::ZERO { Color::Green } else { Color::Red })
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn build_daily_table(days: &[DailyCost]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Import", "Export", "Import cost", "Export revenue", "Net"]);
    for day in days {
        table.add_row(vec![
            Cell::new(day.date.format("%b %d")),
            energy_cell(day.cost.flow.import, Color::Red),
            energy_cell(day.cost.flow.export, Color::Cyan),
            Cell::new(day.cost.import_cost).set_alignment(CellAlignment::Right),
            Cell::new(day.cost.export_revenue).set_alignment(CellAlignment::Right),
            cost_cell(day.cost.net()),
        ]);
    }
    table
}

pub fn build_recommendations_table(plan: &[TimeStep], recommendations: &[Recommendation]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Time", "Price", "Surplus", "Action", "Score", "Residual", "Reason"]);
    for (step, recommendation) in plan.iter().zip(recommendations) {
        let surplus = step.surplus();
        table.add_row(vec![
            Cell::new(recommendation.timestamp.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(recommendation.timestamp.format("%H:%M")),
            Cell::new(step.price.map(|price| price.to_string()).unwrap_or_default())
                .set_alignment(CellAlignment::Right),
            Cell::new(surplus)
                .set_alignment(CellAlignment::Right)
                .fg(if surplus >= KilowattHours::ZERO { Color::Green } else { Color::Red }),
            Cell::new(recommendation.action).fg(recommendation.action.color()),
            Cell::new(format!("{:.2}", recommendation.score)).set_alignment(CellAlignment::Right),
            Cell::new(recommendation.residual_energy).set_alignment(CellAlignment::Right),
            Cell::new(&recommendation.reason).add_attribute(Attribute::Dim),
        ]);
    }
    table
}
