//! CSV ingestion and alignment of the PV, consumption and price series.

mod align;
mod column;
mod plan;

pub use self::{
    align::{Window, align},
    column::{Column, parse_column, read_column},
    plan::{MAX_PLAN_HOURS, build_plan},
};
