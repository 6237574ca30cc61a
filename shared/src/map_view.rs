//! Viewport follow/panned state machine.
//!
//! `Following`: every change of the selected region's coordinates moves the
//! center. `Panned`: the user moved the map, selection changes are recorded
//! but the center stays put until an explicit recenter.
//!
//! Every move the controller makes is handed to the shell as a
//! [`ViewportCommand`]; the shell reports moves back tagged with a
//! [`MoveOrigin`]. Only `User` moves can leave `Following`, so applying a
//! command can never be mistaken for a pan.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::region::Coordinate;

pub const MIN_ZOOM: f64 = 3.0;
pub const MAX_ZOOM: f64 = 18.0;
pub const DEFAULT_ZOOM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowMode {
    Following,
    Panned,
}

/// Provenance of a viewport change reported by the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOrigin {
    /// Pan or zoom gesture.
    User,
    /// The map applying a [`ViewportCommand`].
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLevel(f64);

impl ZoomLevel {
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(MIN_ZOOM, MAX_ZOOM))
        } else {
            Self(DEFAULT_ZOOM)
        }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(DEFAULT_ZOOM)
    }
}

/// A programmatic move for the shell to apply. `revision` increases with each
/// command so the shell can tell a new command from a re-render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportCommand {
    pub center: Coordinate,
    pub zoom: f64,
    pub revision: u64,
}

#[derive(Debug, Clone)]
pub struct MapViewController {
    center: Coordinate,
    zoom: ZoomLevel,
    mode: FollowMode,
    target: Coordinate,
    revision: u64,
}

impl MapViewController {
    /// Mounts in `Following`, centered on the selection or the reference city.
    pub fn new(selection: Option<Coordinate>) -> Self {
        let center = selection.unwrap_or_default();
        Self {
            center,
            zoom: ZoomLevel::default(),
            mode: FollowMode::Following,
            target: center,
            revision: 1,
        }
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom.value()
    }

    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    pub fn is_following(&self) -> bool {
        self.mode == FollowMode::Following
    }

    /// Latest selection coordinates, whether or not the viewport shows them.
    pub fn target(&self) -> Coordinate {
        self.target
    }

    /// The last command issued.
    pub fn command(&self) -> ViewportCommand {
        ViewportCommand {
            center: self.center,
            zoom: self.zoom.value(),
            revision: self.revision,
        }
    }

    /// Records new selection coordinates. Returns a command when the viewport
    /// should move, which only happens in `Following` and only when the
    /// selection actually moved.
    pub fn selection_changed(&mut self, target: Coordinate) -> Option<ViewportCommand> {
        if target == self.target {
            return None;
        }
        self.target = target;

        match self.mode {
            FollowMode::Following => {
                self.center = target;
                Some(self.issue())
            }
            FollowMode::Panned => {
                debug!(
                    lat = target.lat(),
                    lon = target.lon(),
                    "selection changed while panned, viewport kept"
                );
                None
            }
        }
    }

    pub fn viewport_moved(&mut self, center: Coordinate, zoom: Option<f64>, origin: MoveOrigin) {
        self.center = center;
        if let Some(zoom) = zoom {
            self.zoom = ZoomLevel::new(zoom);
        }
        if origin == MoveOrigin::User && self.mode == FollowMode::Following {
            debug!("user moved the map, following suspended");
            self.mode = FollowMode::Panned;
        }
    }

    /// Back to `Following`, centered on the latest selection.
    pub fn recenter(&mut self) -> ViewportCommand {
        self.mode = FollowMode::Following;
        self.center = self.target;
        self.issue()
    }

    fn issue(&mut self) -> ViewportCommand {
        self.revision += 1;
        self.command()
    }
}
