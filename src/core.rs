pub mod advisor;
pub mod battery;
pub mod comparison;
pub mod cost;
pub mod flow;
pub mod series;
pub mod step;

pub use self::{
    advisor::{Action, PriceThreshold, Recommendation, recommend},
    battery::{BatteryConfiguration, BatteryEfficiency, Simulator, simulate},
    comparison::{CostComparison, CostSummary, compare_costs},
    cost::{CostPolicy, CostReport, DailyCost, ExportMode, StepCost, price},
    flow::{Flow, SystemFlow},
    series::TimeStep,
    step::SimulationStep,
};
