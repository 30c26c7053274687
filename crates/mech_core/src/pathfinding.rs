//! Grid-based pathfinding using A*, plus a waypoint follower that turns a
//! path into per-tick steering targets.
//!
//! The search is deterministic: equal f-scores break ties on grid
//! coordinates and neighbours are expanded in a fixed order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::f64::consts::SQRT_2;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::{angle_distance, heading_to, in_proximity};
use crate::units::Unit;

/// Cell types for the navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    /// Open ground (cost 1).
    #[default]
    Walkable,
    /// Impassable.
    Blocked,
    /// Rough ground with 2x movement cost.
    Rough,
}

impl CellType {
    /// Movement cost, `None` for blocked cells.
    #[must_use]
    pub const fn movement_cost(self) -> Option<f64> {
        match self {
            Self::Walkable => Some(1.0),
            Self::Blocked => None,
            Self::Rough => Some(2.0),
        }
    }

    /// Returns true if units can enter this cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Blocked)
    }
}

/// Navigation grid derived from map collision tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavGrid {
    width: u32,
    height: u32,
    /// Row-major cells.
    cells: Vec<CellType>,
    /// Cell edge in world units.
    cell_size: f64,
}

impl NavGrid {
    /// Create an all-walkable grid.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidResource`] for an empty grid or a
    /// non-positive cell size.
    pub fn new(width: u32, height: u32, cell_size: f64) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SimError::invalid_resource("nav grid", "width and height must be positive"));
        }
        if cell_size <= 0.0 {
            return Err(SimError::invalid_resource("nav grid", "cell_size must be positive"));
        }
        Ok(Self {
            width,
            height,
            cells: vec![CellType::Walkable; (width as usize) * (height as usize)],
            cell_size,
        })
    }

    /// Build a grid from row-major collision flags (`true` = blocked).
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new), and when `collision` does not hold
    /// exactly `width × height` tiles.
    pub fn from_collision(width: u32, height: u32, cell_size: f64, collision: &[bool]) -> Result<Self> {
        let mut grid = Self::new(width, height, cell_size)?;
        if collision.len() != grid.cells.len() {
            return Err(SimError::invalid_resource(
                "nav grid",
                format!("expected {} collision tiles, got {}", grid.cells.len(), collision.len()),
            ));
        }
        for (cell, &blocked) in grid.cells.iter_mut().zip(collision) {
            if blocked {
                *cell = CellType::Blocked;
            }
        }
        Ok(grid)
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cell edge in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Cell at coordinates, `None` out of bounds.
    #[must_use]
    pub fn get_cell(&self, x: u32, y: u32) -> Option<CellType> {
        self.in_bounds(x, y).then(|| self.cells[self.index(x, y)])
    }

    /// Set a cell. Returns `false` out of bounds.
    pub fn set_cell(&mut self, x: u32, y: u32, cell_type: CellType) -> bool {
        if self.in_bounds(x, y) {
            let index = self.index(x, y);
            self.cells[index] = cell_type;
            true
        } else {
            false
        }
    }

    /// Check if a cell is walkable.
    #[must_use]
    pub fn is_walkable(&self, x: u32, y: u32) -> bool {
        self.get_cell(x, y).is_some_and(CellType::is_walkable)
    }

    /// Grid coordinates of a world position, `None` outside the grid.
    #[must_use]
    pub fn world_to_grid(&self, pos: DVec2) -> Option<(u32, u32)> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let x = (pos.x / self.cell_size).floor();
        let y = (pos.y / self.cell_size).floor();
        if x < f64::from(self.width) && y < f64::from(self.height) {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }

    /// World position of a cell center.
    #[must_use]
    pub fn grid_to_world(&self, x: u32, y: u32) -> DVec2 {
        (DVec2::new(f64::from(x), f64::from(y)) + 0.5) * self.cell_size
    }

    /// Movement cost of a cell, `None` for blocked or out-of-bounds cells.
    #[must_use]
    pub fn movement_cost(&self, x: u32, y: u32) -> Option<f64> {
        self.get_cell(x, y).and_then(CellType::movement_cost)
    }
}

/// A node in the A* open set.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AStarNode {
    x: u32,
    y: u32,
    f_score: f64,
    /// Lower coordinates first on equal f-score.
    tie_breaker: u64,
}

impl Eq for AStarNode {}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap
        match other.f_score.total_cmp(&self.f_score) {
            Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Neighbour offsets, expanded in this order.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Octile distance, admissible for 8-directional movement with √2 diagonals.
#[inline]
fn octile_heuristic(x1: u32, y1: u32, x2: u32, y2: u32) -> f64 {
    let dx = f64::from(x1.abs_diff(x2));
    let dy = f64::from(y1.abs_diff(y2));
    dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy)
}

#[inline]
fn neighbour(grid: &NavGrid, x: u32, y: u32, dx: i32, dy: i32) -> Option<(u32, u32)> {
    let nx = x.checked_add_signed(dx)?;
    let ny = y.checked_add_signed(dy)?;
    grid.in_bounds(nx, ny).then_some((nx, ny))
}

/// Diagonal moves may not cut past a blocked corner.
#[inline]
fn is_diagonal_valid(grid: &NavGrid, x: u32, y: u32, dx: i32, dy: i32) -> bool {
    if dx == 0 || dy == 0 {
        return true;
    }
    let side_x = neighbour(grid, x, y, dx, 0).is_some_and(|(cx, cy)| grid.is_walkable(cx, cy));
    let side_y = neighbour(grid, x, y, 0, dy).is_some_and(|(cx, cy)| grid.is_walkable(cx, cy));
    side_x && side_y
}

#[inline]
fn tie_breaker(x: u32, y: u32) -> u64 {
    (u64::from(y) << 32) | u64::from(x)
}

/// Find a path between two world positions.
///
/// Returns cell-center waypoints from the start cell to the goal cell.
///
/// # Errors
///
/// - [`SimError::OutsideGrid`] if start or goal lies outside the grid
/// - [`SimError::BlockedCell`] if start or goal is blocked
/// - [`SimError::NoPath`] if the goal is unreachable
pub fn find_path(grid: &NavGrid, start: DVec2, goal: DVec2) -> Result<Vec<DVec2>> {
    let (start_x, start_y) = grid
        .world_to_grid(start)
        .ok_or(SimError::OutsideGrid { x: start.x, y: start.y })?;
    let (goal_x, goal_y) = grid
        .world_to_grid(goal)
        .ok_or(SimError::OutsideGrid { x: goal.x, y: goal.y })?;

    for (x, y) in [(start_x, start_y), (goal_x, goal_y)] {
        if !grid.is_walkable(x, y) {
            return Err(SimError::BlockedCell { x, y });
        }
    }

    if (start_x, start_y) == (goal_x, goal_y) {
        return Ok(vec![grid.grid_to_world(start_x, start_y)]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
    let mut g_score: HashMap<(u32, u32), f64> = HashMap::new();

    g_score.insert((start_x, start_y), 0.0);
    open_set.push(AStarNode {
        x: start_x,
        y: start_y,
        f_score: octile_heuristic(start_x, start_y, goal_x, goal_y),
        tie_breaker: tie_breaker(start_x, start_y),
    });

    while let Some(current) = open_set.pop() {
        if (current.x, current.y) == (goal_x, goal_y) {
            return Ok(reconstruct_path(grid, &came_from, goal_x, goal_y));
        }
        let current_g = g_score
            .get(&(current.x, current.y))
            .copied()
            .unwrap_or(f64::INFINITY);

        for &(dx, dy) in &DIRECTIONS {
            let Some((nx, ny)) = neighbour(grid, current.x, current.y, dx, dy) else {
                continue;
            };
            let Some(cell_cost) = grid.movement_cost(nx, ny) else {
                continue;
            };
            if !is_diagonal_valid(grid, current.x, current.y, dx, dy) {
                continue;
            }

            let step = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
            let tentative_g = current_g + cell_cost * step;
            let neighbour_g = g_score.get(&(nx, ny)).copied().unwrap_or(f64::INFINITY);

            if tentative_g < neighbour_g {
                came_from.insert((nx, ny), (current.x, current.y));
                g_score.insert((nx, ny), tentative_g);
                open_set.push(AStarNode {
                    x: nx,
                    y: ny,
                    f_score: tentative_g + octile_heuristic(nx, ny, goal_x, goal_y),
                    tie_breaker: tie_breaker(nx, ny),
                });
            }
        }
    }

    Err(SimError::NoPath {
        from_x: start_x,
        from_y: start_y,
        to_x: goal_x,
        to_y: goal_y,
    })
}

fn reconstruct_path(
    grid: &NavGrid,
    came_from: &HashMap<(u32, u32), (u32, u32)>,
    goal_x: u32,
    goal_y: u32,
) -> Vec<DVec2> {
    let mut current = (goal_x, goal_y);
    let mut path = vec![grid.grid_to_world(goal_x, goal_y)];
    while let Some(&prev) = came_from.get(&current) {
        path.push(grid.grid_to_world(prev.0, prev.1));
        current = prev;
    }
    path.reverse();
    path
}

/// Drop waypoints that can be skipped with a clear line of sight.
#[must_use]
pub fn smooth_path(grid: &NavGrid, path: Vec<DVec2>) -> Vec<DVec2> {
    if path.len() <= 2 {
        return path;
    }

    let mut smoothed = Vec::with_capacity(path.len());
    smoothed.push(path[0]);

    let mut current = 0;
    while current < path.len() - 1 {
        let mut furthest = current + 1;
        for check in (current + 2)..path.len() {
            if has_line_of_sight(grid, path[current], path[check]) {
                furthest = check;
            }
        }
        smoothed.push(path[furthest]);
        current = furthest;
    }

    smoothed
}

/// Bresenham walk between two cells, refusing blocked cells and corner cuts.
fn has_line_of_sight(grid: &NavGrid, start: DVec2, end: DVec2) -> bool {
    let (Some((x0, y0)), Some((x1, y1))) = (grid.world_to_grid(start), grid.world_to_grid(end))
    else {
        return false;
    };
    let (x1, y1) = (i64::from(x1), i64::from(y1));
    let dx = (x1 - i64::from(x0)).abs();
    let dy = (y1 - i64::from(y0)).abs();
    let sx = if i64::from(x0) < x1 { 1 } else { -1 };
    let sy = if i64::from(y0) < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    let (mut x, mut y) = (i64::from(x0), i64::from(y0));

    let walkable = |x: i64, y: i64| {
        u32::try_from(x)
            .ok()
            .zip(u32::try_from(y).ok())
            .is_some_and(|(x, y)| grid.is_walkable(x, y))
    };

    loop {
        if !walkable(x, y) {
            return false;
        }
        if x == x1 && y == y1 {
            return true;
        }
        let e2 = 2 * err;
        if e2 > -dy && e2 < dx && (!walkable(x + sx, y) || !walkable(x, y + sy)) {
            return false;
        }
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Feeds a waypoint list into a unit's heading and speed targets, one
/// tick at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathFollower {
    waypoints: Vec<DVec2>,
    next: usize,
    /// Speed target while following, world units per tick.
    pub speed: f64,
    /// Distance at which a waypoint counts as reached.
    pub arrival_radius: f64,
}

impl PathFollower {
    /// Follow `waypoints` at `speed`.
    #[must_use]
    pub fn new(waypoints: Vec<DVec2>, speed: f64, arrival_radius: f64) -> Self {
        Self {
            waypoints,
            next: 0,
            speed,
            arrival_radius,
        }
    }

    /// Waypoint currently steered toward.
    #[must_use]
    pub fn current_waypoint(&self) -> Option<DVec2> {
        self.waypoints.get(self.next).copied()
    }

    /// True once every waypoint has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next >= self.waypoints.len()
    }

    /// Advance past reached waypoints and set the unit's steering targets.
    /// Stops the unit once the path is done.
    pub fn steer<U: Unit + ?Sized>(&mut self, unit: &mut U) {
        let position = unit.position();
        while self
            .current_waypoint()
            .is_some_and(|wp| in_proximity(position, wp, self.arrival_radius))
        {
            self.next += 1;
        }

        match self.current_waypoint() {
            Some(waypoint) => {
                let turn = angle_distance(unit.heading(), heading_to(position, waypoint));
                unit.set_target_relative_heading(turn);
                unit.set_target_velocity(self.speed);
            }
            None => {
                unit.set_target_relative_heading(0.0);
                unit.set_target_velocity(0.0);
            }
        }
    }
}
