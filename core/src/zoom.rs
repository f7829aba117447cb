//! Zoom levels and the pixel metrics attached to each of them.

use serde::{Deserialize, Serialize};

/// Number of distinct zoom levels.
pub const NR_OF_ZOOMS: usize = 3;

/// Graphics resolution used to draw the world.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Zoom {
    /// Small graphics, 16x8 pixel tiles.
    Sgfx,
    /// Medium graphics, 32x16 pixel tiles.
    Mgfx,
    /// Full graphics, 64x32 pixel tiles.
    #[default]
    Gfx,
}

/// Direction of a zoom request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeZoom {
    /// Towards [`Zoom::Gfx`].
    ZoomIn,
    /// Towards [`Zoom::Sgfx`].
    ZoomOut,
}

impl Zoom {
    /// All zoom levels from smallest to largest.
    pub const ALL: [Zoom; NR_OF_ZOOMS] = [Zoom::Sgfx, Zoom::Mgfx, Zoom::Gfx];

    /// Zero-based position of the zoom inside [`Zoom::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Sgfx => 0,
            Self::Mgfx => 1,
            Self::Gfx => 2,
        }
    }

    /// Width of a tile in pixels.
    #[must_use]
    pub const fn tile_width(self) -> i32 {
        match self {
            Self::Sgfx => 16,
            Self::Mgfx => 32,
            Self::Gfx => 64,
        }
    }

    /// Height of a tile in pixels.
    #[must_use]
    pub const fn tile_height(self) -> i32 {
        match self {
            Self::Sgfx => 8,
            Self::Mgfx => 16,
            Self::Gfx => 32,
        }
    }

    /// Half of [`Zoom::tile_width`].
    #[must_use]
    pub const fn tile_width_half(self) -> i32 {
        self.tile_width() / 2
    }

    /// Half of [`Zoom::tile_height`].
    #[must_use]
    pub const fn tile_height_half(self) -> i32 {
        self.tile_height() / 2
    }

    /// Vertical pixel offset of buildings standing above water level.
    #[must_use]
    pub const fn elevation(self) -> i32 {
        match self {
            Self::Sgfx => 5,
            Self::Mgfx => 10,
            Self::Gfx => 20,
        }
    }

    /// Next larger zoom, stopping at [`Zoom::Gfx`].
    #[must_use]
    pub const fn zoom_in(self) -> Self {
        match self {
            Self::Sgfx => Self::Mgfx,
            Self::Mgfx | Self::Gfx => Self::Gfx,
        }
    }

    /// Next smaller zoom, stopping at [`Zoom::Sgfx`].
    #[must_use]
    pub const fn zoom_out(self) -> Self {
        match self {
            Self::Sgfx | Self::Mgfx => Self::Sgfx,
            Self::Gfx => Self::Mgfx,
        }
    }

    /// Applies a player-driven zoom step.
    #[must_use]
    pub const fn step(self, change: ChangeZoom) -> Self {
        match change {
            ChangeZoom::ZoomIn => self.zoom_in(),
            ChangeZoom::ZoomOut => self.zoom_out(),
        }
    }

    /// Lower-case name, matching the asset directory of the zoom.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sgfx => "sgfx",
            Self::Mgfx => "mgfx",
            Self::Gfx => "gfx",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_clamp_at_both_ends() {
        assert_eq!(Zoom::Gfx.zoom_in(), Zoom::Gfx);
        assert_eq!(Zoom::Sgfx.zoom_out(), Zoom::Sgfx);
        assert_eq!(Zoom::Sgfx.step(ChangeZoom::ZoomIn), Zoom::Mgfx);
        assert_eq!(Zoom::Mgfx.step(ChangeZoom::ZoomOut), Zoom::Sgfx);
    }

    #[test]
    fn tile_metrics_match_each_level() {
        assert_eq!((Zoom::Sgfx.tile_width(), Zoom::Sgfx.tile_height()), (16, 8));
        assert_eq!((Zoom::Mgfx.tile_width(), Zoom::Mgfx.tile_height()), (32, 16));
        assert_eq!((Zoom::Gfx.tile_width(), Zoom::Gfx.tile_height()), (64, 32));
        assert_eq!(Zoom::Gfx.tile_width_half(), 32);
        assert_eq!(Zoom::Gfx.tile_height_half(), 16);
        assert_eq!(
            Zoom::ALL.map(Zoom::elevation),
            [5, 10, 20],
            "elevation doubles with every zoom level"
        );
    }
}
