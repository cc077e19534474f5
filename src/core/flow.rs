use std::{iter::Sum, ops::Add};

use serde::Serialize;

use crate::quantity::energy::KilowattHours;

/// Generic bidirectional energy flow.
#[must_use]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sub,
)]
pub struct Flow<T> {
    /// Importing from the grid or charging the battery.
    pub import: T,

    /// Exporting to the grid or discharging the battery.
    pub export: T,
}

impl Flow<KilowattHours> {
    pub const ZERO: Self = Self { import: KilowattHours::ZERO, export: KilowattHours::ZERO };

    /// Split a net deficit into a one-directional flow.
    ///
    /// Positive deficit becomes import, negative deficit becomes export.
    pub fn from_net_deficit(net_deficit: KilowattHours) -> Self {
        Self {
            import: net_deficit.max(KilowattHours::ZERO),
            export: (-net_deficit).max(KilowattHours::ZERO),
        }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.import.is_finite()
            && self.export.is_finite()
            && self.import.is_non_negative()
            && self.export.is_non_negative()
    }
}

impl<T> Sum for Flow<T>
where
    Self: Default + Add<Output = Self>,
{
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Energy flows at the household connection point within one step.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, derive_more::Add, derive_more::AddAssign)]
pub struct SystemFlow<T> {
    pub grid: Flow<T>,

    /// Battery import is the grid-side charge, battery export is the load-side discharge.
    pub battery: Flow<T>,
}

impl<T> Sum for SystemFlow<T>
where
    Self: Default + Add<Output = Self>,
{
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl SystemFlow<KilowattHours> {
    /// Flows of a household without storage: the whole net deficit goes through the grid.
    pub fn without_battery(production: KilowattHours, consumption: KilowattHours) -> Self {
        Self { grid: Flow::from_net_deficit(consumption - production), battery: Flow::ZERO }
    }

    /// Signed energy balance error: sources minus sinks.
    ///
    /// Production, discharge and import feed the connection point;
    /// consumption, charge and export drain it. The result is zero for a balanced step.
    pub fn imbalance(self, production: KilowattHours, consumption: KilowattHours) -> KilowattHours {
        (production + self.battery.export + self.grid.import)
            - (consumption + self.battery.import + self.grid.export)
    }
}
