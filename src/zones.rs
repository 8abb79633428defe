//! Fixed table of interaction zones.
//!
//! Zones are looked up by [`ZoneId`] and validated once, when the table is
//! built. Everything downstream can assume ids are unique and radii positive.

use std::fmt;

use bevy::prelude::*;
use thiserror::Error;

/// Stable identifier of an interaction zone, also used as the panel key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ZoneId(&'static str);

impl ZoneId {
    pub const ABOUT: ZoneId = ZoneId("about");
    pub const PROJECTS: ZoneId = ZoneId("projects");
    pub const CONTACT: ZoneId = ZoneId("contact");

    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub position: Vec3,
    pub radius: f32,
}

impl Zone {
    pub const fn new(id: ZoneId, position: Vec3, radius: f32) -> Self {
        Self {
            id,
            position,
            radius,
        }
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }

    /// Strictly inside the trigger radius.
    pub fn contains(&self, point: Vec3) -> bool {
        self.distance_to(point) < self.radius
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ZoneRegistryError {
    #[error("zone registry is empty")]
    Empty,

    #[error("zone id `{0}` is defined more than once")]
    DuplicateId(ZoneId),

    #[error("zone `{id}` has an invalid trigger radius {radius}")]
    InvalidRadius { id: ZoneId, radius: f32 },

    #[error("zone `{0}` has a non-finite position")]
    InvalidPosition(ZoneId),
}

#[derive(Resource, Debug, Clone)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    pub fn new(zones: impl IntoIterator<Item = Zone>) -> Result<Self, ZoneRegistryError> {
        let zones: Vec<Zone> = zones.into_iter().collect();
        if zones.is_empty() {
            return Err(ZoneRegistryError::Empty);
        }

        for (i, zone) in zones.iter().enumerate() {
            if zones[..i].iter().any(|z| z.id == zone.id) {
                return Err(ZoneRegistryError::DuplicateId(zone.id));
            }
            if !zone.radius.is_finite() || zone.radius <= 0.0 {
                return Err(ZoneRegistryError::InvalidRadius {
                    id: zone.id,
                    radius: zone.radius,
                });
            }
            if !zone.position.is_finite() {
                return Err(ZoneRegistryError::InvalidPosition(zone.id));
            }
        }

        Ok(Self { zones })
    }

    /// The three spots laid out around the origin of the ground plane.
    pub fn portfolio() -> Result<Self, ZoneRegistryError> {
        Self::new([
            Zone::new(ZoneId::ABOUT, Vec3::new(5.0, 0.0, 5.0), 2.0),
            Zone::new(ZoneId::PROJECTS, Vec3::new(-5.0, 0.0, 5.0), 2.0),
            Zone::new(ZoneId::CONTACT, Vec3::new(0.0, 0.0, -5.0), 2.0),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Nearest zone whose radius contains `point`. On an exact tie the
    /// earlier zone in the table wins.
    pub fn nearest_within(&self, point: Vec3) -> Option<&Zone> {
        let mut best: Option<(&Zone, f32)> = None;
        for zone in &self.zones {
            let d = zone.distance_to(point);
            if d >= zone.radius {
                continue;
            }
            match best {
                Some((_, best_d)) if best_d <= d => {}
                _ => best = Some((zone, d)),
            }
        }
        best.map(|(zone, _)| zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_layout_is_valid() {
        let registry = ZoneRegistry::portfolio().unwrap();
        let ids: Vec<ZoneId> = registry.iter().map(|z| z.id).collect();
        assert_eq!(ids, vec![ZoneId::ABOUT, ZoneId::PROJECTS, ZoneId::CONTACT]);
        let contact = registry.iter().find(|z| z.id == ZoneId::CONTACT);
        assert_eq!(contact.map(|z| z.position), Some(Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn rejects_empty_table() {
        let err = ZoneRegistry::new(std::iter::empty()).unwrap_err();
        assert_eq!(err, ZoneRegistryError::Empty);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = ZoneRegistry::new([
            Zone::new(ZoneId::ABOUT, Vec3::ZERO, 1.0),
            Zone::new(ZoneId::ABOUT, Vec3::X, 1.0),
        ])
        .unwrap_err();
        assert_eq!(err, ZoneRegistryError::DuplicateId(ZoneId::ABOUT));
    }

    #[test]
    fn rejects_bad_radius_and_position() {
        let err = ZoneRegistry::new([Zone::new(ZoneId::ABOUT, Vec3::ZERO, 0.0)]).unwrap_err();
        assert!(matches!(err, ZoneRegistryError::InvalidRadius { .. }));

        let err =
            ZoneRegistry::new([Zone::new(ZoneId::ABOUT, Vec3::ZERO, f32::NAN)]).unwrap_err();
        assert!(matches!(err, ZoneRegistryError::InvalidRadius { .. }));

        let err = ZoneRegistry::new([Zone::new(ZoneId::ABOUT, Vec3::splat(f32::INFINITY), 1.0)])
            .unwrap_err();
        assert_eq!(err, ZoneRegistryError::InvalidPosition(ZoneId::ABOUT));
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        let zone = Zone::new(ZoneId::ABOUT, Vec3::ZERO, 2.0);
        assert!(zone.contains(Vec3::new(1.999, 0.0, 0.0)));
        assert!(!zone.contains(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn overlapping_zones_pick_the_nearest() {
        let registry = ZoneRegistry::new([
            Zone::new(ZoneId::ABOUT, Vec3::ZERO, 3.0),
            Zone::new(ZoneId::PROJECTS, Vec3::new(2.0, 0.0, 0.0), 3.0),
        ])
        .unwrap();

        let near_about = registry.nearest_within(Vec3::new(0.5, 0.0, 0.0)).unwrap();
        assert_eq!(near_about.id, ZoneId::ABOUT);

        let near_projects = registry.nearest_within(Vec3::new(1.5, 0.0, 0.0)).unwrap();
        assert_eq!(near_projects.id, ZoneId::PROJECTS);

        let tie = registry.nearest_within(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(tie.id, ZoneId::ABOUT);

        assert!(registry.nearest_within(Vec3::new(0.0, 0.0, 10.0)).is_none());
    }
}
