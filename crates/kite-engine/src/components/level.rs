//! Static level geometry.
//!
//! A level is a grid of solid/empty tiles in row-major order (index = row * cols + col).
//! State logic asks it "is there ground here" through [`TileLookup`]; the scene
//! resolves entities against the solid hitboxes it produces.

use glam::Vec2;
use serde::Deserialize;

use crate::api::error::{EngineError, Result};
use crate::components::hitbox::{Colour, Hitbox};

/// Occupancy of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tile {
    #[default]
    Empty,
    Solid,
}

impl Tile {
    pub fn is_solid(self) -> bool {
        self == Tile::Solid
    }
}

/// Read-only tile queries available to states.
pub trait TileLookup {
    /// Tile at grid cell (`col`, `row`). Cells outside the grid are `Empty`.
    fn tile_at(&self, col: i32, row: i32) -> Tile;

    /// Edge length of a tile in world units.
    fn tile_size(&self) -> f32;

    /// Tile under a world-space point.
    fn tile_at_point(&self, point: Vec2) -> Tile {
        let size = self.tile_size();
        if size <= 0.0 {
            return Tile::Empty;
        }
        self.tile_at((point.x / size).floor() as i32, (point.y / size).floor() as i32)
    }

    fn is_solid_at(&self, point: Vec2) -> bool {
        self.tile_at_point(point).is_solid()
    }
}

/// On-disk level description: ASCII rows where `#` is solid.
#[derive(Debug, Deserialize)]
struct LevelFile {
    tile_size: f32,
    rows: Vec<String>,
}

/// Tile grid for one level.
#[derive(Debug, Clone)]
pub struct Level {
    cols: u32,
    rows: u32,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl Level {
    /// An all-empty grid. Fails if `cols * rows` does not fit in a `u32`.
    pub fn new(cols: u32, rows: u32, tile_size: f32) -> Result<Self> {
        let len = cols
            .checked_mul(rows)
            .ok_or_else(|| EngineError::Level(format!("{}x{} tiles is too large a grid", cols, rows)))?;
        Ok(Self {
            cols,
            rows,
            tile_size,
            tiles: vec![Tile::Empty; len as usize],
        })
    }

    /// A level with no tiles at all; every lookup is `Empty`.
    pub fn empty() -> Self {
        Self {
            cols: 0,
            rows: 0,
            tile_size: 16.0,
            tiles: Vec::new(),
        }
    }

    /// Build from ASCII rows: `#` is solid, anything else empty.
    /// All rows must have the same width.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_size: f32) -> Result<Self> {
        if tile_size <= 0.0 {
            return Err(EngineError::Level(format!("tile size must be positive, got {}", tile_size)));
        }
        let cols = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        let too_large = || EngineError::Level(format!("{}x{} tiles is too large a grid", cols, rows.len()));
        let mut level = Self::new(
            u32::try_from(cols).map_err(|_| too_large())?,
            u32::try_from(rows.len()).map_err(|_| too_large())?,
            tile_size,
        )?;

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let width = line.chars().count();
            if width != cols {
                return Err(EngineError::Level(format!(
                    "row {} has {} columns, expected {}",
                    row, width, cols
                )));
            }
            for (col, ch) in line.chars().enumerate() {
                if ch == '#' {
                    level.set(col as u32, row as u32, Tile::Solid);
                }
            }
        }

        log::debug!("level loaded: {}x{} tiles of {}", level.cols, level.rows, tile_size);
        Ok(level)
    }

    /// Parse `{ "tile_size": 16, "rows": ["....", "####"] }`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LevelFile = serde_json::from_str(json)?;
        Self::from_rows(&file.rows, file.tile_size)
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Scene bounds in world units.
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.cols as f32, self.rows as f32) * self.tile_size
    }

    fn index(&self, col: u32, row: u32) -> Option<usize> {
        if col < self.cols && row < self.rows {
            Some((row * self.cols + col) as usize)
        } else {
            None
        }
    }

    /// Set a tile. Out-of-bounds writes are ignored.
    pub fn set(&mut self, col: u32, row: u32, tile: Tile) {
        if let Some(idx) = self.index(col, row) {
            self.tiles[idx] = tile;
        }
    }

    /// Solid tiles as hitboxes, with horizontal runs merged into one box
    /// so entities walking across tile seams see a single flat surface.
    pub fn solid_hitboxes(&self) -> Vec<Hitbox> {
        let mut boxes = Vec::new();
        for row in 0..self.rows {
            let mut run_start: Option<u32> = None;
            for col in 0..=self.cols {
                let solid = col < self.cols && self.tile_at(col as i32, row as i32).is_solid();
                match (solid, run_start) {
                    (true, None) => run_start = Some(col),
                    (false, Some(start)) => {
                        boxes.push(
                            Hitbox::new(
                                start as f32 * self.tile_size,
                                row as f32 * self.tile_size,
                                (col - start) as f32 * self.tile_size,
                                self.tile_size,
                            )
                            .with_colour(Colour::BLUE),
                        );
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        boxes
    }
}

impl TileLookup for Level {
    fn tile_at(&self, col: i32, row: i32) -> Tile {
        if col < 0 || row < 0 {
            return Tile::Empty;
        }
        self.index(col as u32, row as u32)
            .map(|idx| self.tiles[idx])
            .unwrap_or(Tile::Empty)
    }

    fn tile_size(&self) -> f32 {
        self.tile_size
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::empty()
    }
}
