// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of neighbor lists with a safety margin.
//!
//! Neighbor lists store, for every particle, all particles located within the neighbor range
//! at the time of the last rebuild. As long as no particle moved further than the displacement
//! limit since the last rebuild, the lists still contain every pair closer than the interaction range.

pub mod criterion;
pub mod manager;

use getset::CopyGetters;

use crate::errors::NeighborError;

/// Parameters of the neighbor lists.
///
/// ## Example
/// ```
/// # use neighbors_rs::prelude::*;
/// #
/// let settings = NeighborSettings::default()
///     .with_interaction_range(2.5)
///     .with_neighbor_range(3.0)
///     .with_safety_factor(0.45);
///
/// assert!(settings.validate().is_ok());
/// assert_eq!(settings.neighbor_range(), 3.0);
/// ```
#[derive(Debug, Clone, PartialEq, CopyGetters)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct NeighborSettings {
    /// Largest distance at which particles interact.
    #[getset(get_copy = "pub")]
    interaction_range: f64,
    /// Distance within which particles are stored as neighbors. Must be larger than `interaction_range`.
    #[getset(get_copy = "pub")]
    neighbor_range: f64,
    /// Fraction of the skin (`neighbor_range - interaction_range`) a particle may travel before
    /// its neighbors are considered outdated. Must lie in the open interval (0, 0.5).
    #[getset(get_copy = "pub")]
    safety_factor: f64,
}

impl Default for NeighborSettings {
    /// Interaction range 1.0, neighbor range 1.3, safety factor 0.4.
    fn default() -> Self {
        NeighborSettings {
            interaction_range: 1.0,
            neighbor_range: 1.3,
            safety_factor: 0.4,
        }
    }
}

impl NeighborSettings {
    /// Set the interaction range.
    pub fn with_interaction_range(mut self, range: f64) -> Self {
        self.interaction_range = range;
        self
    }

    /// Set the neighbor range.
    pub fn with_neighbor_range(mut self, range: f64) -> Self {
        self.neighbor_range = range;
        self
    }

    /// Set the safety factor.
    pub fn with_safety_factor(mut self, factor: f64) -> Self {
        self.safety_factor = factor;
        self
    }

    /// Check that the settings are consistent.
    ///
    /// ## Returns
    /// - `NeighborError::InvalidRange` if the interaction range is not positive or
    ///   if the neighbor range is not larger than the interaction range.
    /// - `NeighborError::InvalidSafetyFactor` if the safety factor does not lie in (0, 0.5).
    pub fn validate(&self) -> Result<(), NeighborError> {
        if !self.interaction_range.is_finite()
            || !self.neighbor_range.is_finite()
            || self.interaction_range <= 0.0
            || self.neighbor_range <= self.interaction_range
        {
            return Err(NeighborError::InvalidRange {
                interaction: self.interaction_range,
                neighbor: self.neighbor_range,
            });
        }

        if !(self.safety_factor > 0.0 && self.safety_factor < 0.5) {
            return Err(NeighborError::InvalidSafetyFactor(self.safety_factor));
        }

        Ok(())
    }
}

/// Outcome of [`NeighborManager::update`](crate::neighbors::manager::NeighborManager::update).
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct UpdateStatus {
    /// Were the neighbor lists rebuilt?
    #[getset(get_copy = "pub")]
    rebuilt: bool,
    /// Did some particle travel far enough since the previous rebuild
    /// that interacting pairs may have been missed?
    unsafe_displacement: bool,
    /// Largest squared displacement of any particle observed since the previous rebuild.
    #[getset(get_copy = "pub")]
    max_displacement2: f64,
}

impl UpdateStatus {
    pub(crate) fn new(rebuilt: bool, unsafe_displacement: bool, max_displacement2: f64) -> Self {
        UpdateStatus {
            rebuilt,
            unsafe_displacement,
            max_displacement2,
        }
    }

    /// Returns `true` if the safety bound was exceeded before the rebuild.
    ///
    /// In molecular dynamics, this usually means the time step should be shortened.
    /// In Monte Carlo, the move should be rejected.
    pub fn is_unsafe(&self) -> bool {
        self.unsafe_displacement
    }

    /// Convert an unsafe status into an error.
    ///
    /// ## Returns
    /// `UpdateStatus` if the update was safe.
    /// `NeighborError::UnsafeDisplacement` otherwise.
    pub fn check(self) -> Result<Self, NeighborError> {
        if self.unsafe_displacement {
            Err(NeighborError::UnsafeDisplacement(self.max_displacement2))
        } else {
            Ok(self)
        }
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn settings_from_yaml() {
        let string = "interaction_range: 2.5\nneighbor_range: 3.1\nsafety_factor: 0.3\n";
        let settings: NeighborSettings = serde_yaml::from_str(string).unwrap();

        assert_eq!(
            settings,
            NeighborSettings::default()
                .with_interaction_range(2.5)
                .with_neighbor_range(3.1)
                .with_safety_factor(0.3)
        );
    }

    #[test]
    fn settings_unknown_field() {
        let string = "interaction_range: 2.5\nneighbor_range: 3.1\nsafety_factor: 0.3\nskin: 0.6\n";
        assert!(serde_yaml::from_str::<NeighborSettings>(string).is_err());
    }
}
