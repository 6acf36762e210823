//! Named kinematic series aligned with a trajectory.

use std::collections::BTreeMap;
use std::ops::Index;

use kinetrace_core::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{KinematicsError, KinematicsResult};

/// A quantity derived from a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quantity {
    /// Calibrated coordinates before filtering.
    XRaw,
    YRaw,
    /// Calibrated coordinates after filtering (raw if not filtered).
    X,
    Y,
    TotalDistance,
    HorizontalDisplacement,
    VerticalDisplacement,
    Speed,
    HorizontalVelocity,
    VerticalVelocity,
    Acceleration,
    HorizontalAcceleration,
    VerticalAcceleration,
    AngularPosition,
    AngularDisplacement,
    TotalAngularDisplacement,
    AngularVelocity,
    TangentialVelocity,
    AngularAcceleration,
    TangentialAcceleration,
    CentripetalAcceleration,
    ResultantAcceleration,
}

impl Quantity {
    pub const ALL: [Quantity; 22] = [
        Quantity::XRaw,
        Quantity::YRaw,
        Quantity::X,
        Quantity::Y,
        Quantity::TotalDistance,
        Quantity::HorizontalDisplacement,
        Quantity::VerticalDisplacement,
        Quantity::Speed,
        Quantity::HorizontalVelocity,
        Quantity::VerticalVelocity,
        Quantity::Acceleration,
        Quantity::HorizontalAcceleration,
        Quantity::VerticalAcceleration,
        Quantity::AngularPosition,
        Quantity::AngularDisplacement,
        Quantity::TotalAngularDisplacement,
        Quantity::AngularVelocity,
        Quantity::TangentialVelocity,
        Quantity::AngularAcceleration,
        Quantity::TangentialAcceleration,
        Quantity::CentripetalAcceleration,
        Quantity::ResultantAcceleration,
    ];

    /// Column name used in exports.
    pub fn name(self) -> &'static str {
        match self {
            Self::XRaw => "x_raw",
            Self::YRaw => "y_raw",
            Self::X => "x",
            Self::Y => "y",
            Self::TotalDistance => "total_distance",
            Self::HorizontalDisplacement => "horizontal_displacement",
            Self::VerticalDisplacement => "vertical_displacement",
            Self::Speed => "speed",
            Self::HorizontalVelocity => "horizontal_velocity",
            Self::VerticalVelocity => "vertical_velocity",
            Self::Acceleration => "acceleration",
            Self::HorizontalAcceleration => "horizontal_acceleration",
            Self::VerticalAcceleration => "vertical_acceleration",
            Self::AngularPosition => "angular_position",
            Self::AngularDisplacement => "angular_displacement",
            Self::TotalAngularDisplacement => "total_angular_displacement",
            Self::AngularVelocity => "angular_velocity",
            Self::TangentialVelocity => "tangential_velocity",
            Self::AngularAcceleration => "angular_acceleration",
            Self::TangentialAcceleration => "tangential_acceleration",
            Self::CentripetalAcceleration => "centripetal_acceleration",
            Self::ResultantAcceleration => "resultant_acceleration",
        }
    }
}

/// Series keyed by quantity, all the length of the time axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesCollection {
    times: Vec<Timestamp>,
    components: BTreeMap<Quantity, Vec<f64>>,
}

impl TimeSeriesCollection {
    pub fn new(times: Vec<Timestamp>) -> Self {
        Self {
            times,
            components: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    /// Add or replace a series. It must have one value per timestamp.
    pub fn insert(&mut self, quantity: Quantity, values: Vec<f64>) -> KinematicsResult<()> {
        if values.len() != self.times.len() {
            return Err(KinematicsError::LengthMismatch {
                quantity,
                expected: self.times.len(),
                got: values.len(),
            });
        }
        self.components.insert(quantity, values);
        Ok(())
    }

    pub fn get(&self, quantity: Quantity) -> Option<&[f64]> {
        self.components.get(&quantity).map(Vec::as_slice)
    }

    /// Value of `quantity` at `index`, NaN included.
    pub fn value(&self, quantity: Quantity, index: usize) -> Option<f64> {
        self.get(quantity).and_then(|s| s.get(index).copied())
    }

    pub fn contains(&self, quantity: Quantity) -> bool {
        self.components.contains_key(&quantity)
    }

    /// Quantities present, in declaration order.
    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.components.keys().copied()
    }

    pub fn remove(&mut self, quantity: Quantity) -> Option<Vec<f64>> {
        self.components.remove(&quantity)
    }

    /// Move every series of `other` into this collection.
    pub fn merge(&mut self, other: TimeSeriesCollection) -> KinematicsResult<()> {
        if other.times != self.times {
            return Err(KinematicsError::MisalignedTrajectories(format!(
                "{} samples vs {}",
                other.times.len(),
                self.times.len()
            )));
        }
        self.components.extend(other.components);
        Ok(())
    }
}

impl Index<Quantity> for TimeSeriesCollection {
    type Output = [f64];

    /// Panics if the quantity was not computed; use [`TimeSeriesCollection::get`]
    /// when it may be absent.
    fn index(&self, quantity: Quantity) -> &[f64] {
        match self.components.get(&quantity) {
            Some(series) => series,
            None => panic!("quantity {quantity:?} not in collection"),
        }
    }
}
