// lidar.rs - Simulated range sensors mounted on the car
//
// Sampling patterns and result bookkeeping live here; the actual "nearest
// obstacle along a ray" question goes to a `RaycastProvider`.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::animation::{Heading, Vec3};
use crate::error_handling::{MazeError, Result};
use crate::maze::{CellRef, Maze};
use crate::types::Direction;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleRayDirection {
    #[default]
    Forward,
    Right,
    Backward,
    Left,
}

impl SingleRayDirection {
    /// Yaw relative to the car's heading.
    pub fn offset_degrees(self) -> f32 {
        match self {
            SingleRayDirection::Forward => 0.0,
            SingleRayDirection::Right => 90.0,
            SingleRayDirection::Backward => 180.0,
            SingleRayDirection::Left => 270.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SingleRayDirection::Forward => "forward",
            SingleRayDirection::Right => "right",
            SingleRayDirection::Backward => "backward",
            SingleRayDirection::Left => "left",
        }
    }
}

/// Evenly spaced rays over the full circle, in world yaw.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FullCircleConfig {
    pub enabled: bool,
    pub range: f32,
    pub points: usize,
}

impl Default for FullCircleConfig {
    fn default() -> Self {
        Self { enabled: true, range: 10.0, points: 360 }
    }
}

/// A fan of rays centered on the car's heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorConfig {
    pub enabled: bool,
    pub range: f32,
    pub points: usize,
    pub angle_degrees: f32,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self { enabled: true, range: 10.0, points: 90, angle_degrees: 90.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleRayConfig {
    pub enabled: bool,
    pub range: f32,
    pub direction: SingleRayDirection,
}

impl Default for SingleRayConfig {
    fn default() -> Self {
        Self { enabled: true, range: 10.0, direction: SingleRayDirection::Forward }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarPointConfig {
    pub name: String,
    pub enabled: bool,
    /// Mount point in the car frame: x right, y up, z forward.
    pub offset: Vec3,
    pub full_circle: FullCircleConfig,
    pub sector: SectorConfig,
    pub single: SingleRayConfig,
}

impl Default for LidarPointConfig {
    fn default() -> Self {
        Self {
            name: "Point_0".to_string(),
            enabled: true,
            offset: Vec3::zero(),
            full_circle: FullCircleConfig::default(),
            sector: SectorConfig::default(),
            single: SingleRayConfig::default(),
        }
    }
}

fn check_range(name: &str, mode: &str, range: f32) -> Result<()> {
    if range.is_finite() && range > 0.0 {
        Ok(())
    } else {
        Err(MazeError::InvalidConfig {
            reason: format!("lidar point '{name}': {mode} range must be positive, got {range}"),
        })
    }
}

impl LidarPointConfig {
    pub fn validate(&self) -> Result<()> {
        if self.full_circle.enabled {
            check_range(&self.name, "full circle", self.full_circle.range)?;
            if self.full_circle.points == 0 {
                return Err(MazeError::InvalidConfig {
                    reason: format!("lidar point '{}': full circle needs at least one ray", self.name),
                });
            }
        }
        if self.sector.enabled {
            check_range(&self.name, "sector", self.sector.range)?;
            if self.sector.points == 0 || !(0.0..=360.0).contains(&self.sector.angle_degrees) {
                return Err(MazeError::InvalidConfig {
                    reason: format!(
                        "lidar point '{}': sector needs at least one ray and an angle in [0, 360]",
                        self.name
                    ),
                });
            }
        }
        if self.single.enabled {
            check_range(&self.name, "single ray", self.single.range)?;
        }
        Ok(())
    }

    /// World yaw of every full-circle ray; independent of the car heading.
    pub fn full_circle_yaws(&self) -> Vec<f32> {
        let n = self.full_circle.points;
        let step = 360.0 / n.max(1) as f32;
        (0..n).map(|i| i as f32 * step).collect()
    }

    /// World yaw of every sector ray, spread across the sector edges. A
    /// single-ray sector points straight ahead.
    pub fn sector_yaws(&self, heading: Heading) -> Vec<f32> {
        let n = self.sector.points;
        if n <= 1 {
            return vec![heading.degrees(); n];
        }
        let half = self.sector.angle_degrees / 2.0;
        let step = self.sector.angle_degrees / (n - 1) as f32;
        (0..n)
            .map(|i| Heading::new(heading.degrees() - half + i as f32 * step).degrees())
            .collect()
    }

    pub fn single_yaw(&self, heading: Heading) -> f32 {
        Heading::new(heading.degrees() + self.single.direction.offset_degrees()).degrees()
    }

    /// World-space origin of the rays for a car at `position` facing `heading`.
    pub fn origin(&self, position: Vec3, heading: Heading) -> Vec3 {
        let forward = Vec3::from_yaw_degrees(heading.degrees());
        let right = Vec3::from_yaw_degrees(heading.degrees() + 90.0);
        position + right * self.offset.x + Vec3::up() * self.offset.y + forward * self.offset.z
    }
}

// ============================================================================
// RAYCAST COLLABORATOR
// ============================================================================

pub trait RaycastProvider {
    /// Distance to the nearest obstacle along `direction` from `origin`, or
    /// `None` if nothing lies within `max_range`.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Result<Option<f32>>;
}

/// Retry once straight away; a second failure is returned.
///
/// Scans run inside the tick task, which must not sleep, so the retry has no
/// delay.
fn cast_with_retry(provider: &dyn RaycastProvider, origin: Vec3, yaw: f32, range: f32) -> Result<f32> {
    let direction = Vec3::from_yaw_degrees(yaw);
    let hit = match provider.raycast(origin, direction, range) {
        Ok(hit) => hit,
        Err(err) => {
            warn!("Raycast failed ({}), retrying once", err);
            provider.raycast(origin, direction, range)?
        }
    };
    Ok(hit.map_or(range, |d| d.clamp(0.0, range)))
}

// ============================================================================
// READINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SingleReading {
    pub direction: &'static str,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LidarReadings {
    pub full_circle: Option<Vec<f32>>,
    pub sector: Option<Vec<f32>>,
    pub single: Option<SingleReading>,
}

impl LidarReadings {
    pub fn min_distance(&self) -> Option<f32> {
        let full = self.full_circle.iter().flatten().copied();
        let sector = self.sector.iter().flatten().copied();
        let single = self.single.iter().map(|s| s.distance);
        full.chain(sector).chain(single).reduce(f32::min)
    }
}

#[derive(Debug, Clone)]
pub struct LidarPoint {
    config: LidarPointConfig,
    readings: LidarReadings,
    origin: Vec3,
    heading: Heading,
}

impl LidarPoint {
    /// Fresh point; array modes start empty and the single ray reads its range.
    pub fn new(config: LidarPointConfig) -> Self {
        let readings = LidarReadings {
            full_circle: config.full_circle.enabled.then(Vec::new),
            sector: config.sector.enabled.then(Vec::new),
            single: config.single.enabled.then(|| SingleReading {
                direction: config.single.direction.name(),
                distance: config.single.range,
            }),
        };
        Self { config, readings, origin: Vec3::zero(), heading: Heading::default() }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &LidarPointConfig {
        &self.config
    }

    pub fn readings(&self) -> &LidarReadings {
        &self.readings
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn sample(&self, provider: &dyn RaycastProvider, origin: Vec3, heading: Heading) -> Result<LidarReadings> {
        let c = &self.config;

        let full_circle = if c.full_circle.enabled {
            let ranges = c
                .full_circle_yaws()
                .into_iter()
                .map(|yaw| cast_with_retry(provider, origin, yaw, c.full_circle.range))
                .collect::<Result<Vec<_>>>()?;
            Some(ranges)
        } else {
            None
        };

        let sector = if c.sector.enabled {
            let ranges = c
                .sector_yaws(heading)
                .into_iter()
                .map(|yaw| cast_with_retry(provider, origin, yaw, c.sector.range))
                .collect::<Result<Vec<_>>>()?;
            Some(ranges)
        } else {
            None
        };

        let single = if c.single.enabled {
            let distance = cast_with_retry(provider, origin, c.single_yaw(heading), c.single.range)?;
            Some(SingleReading { direction: c.single.direction.name(), distance })
        } else {
            None
        };

        Ok(LidarReadings { full_circle, sector, single })
    }
}

// ============================================================================
// SENSOR MODEL
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LidarPointReport {
    pub name: String,
    pub position: Vec3,
    pub heading: f32,
    #[serde(flatten)]
    pub readings: LidarReadings,
}

#[derive(Debug, Clone, Serialize)]
pub struct LidarReport {
    pub points: Vec<LidarPointReport>,
    pub global_min_distance: Option<f32>,
    pub point_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SensorModel {
    points: Vec<LidarPoint>,
}

impl SensorModel {
    pub fn new(configs: &[LidarPointConfig]) -> Self {
        Self { points: configs.iter().cloned().map(LidarPoint::new).collect() }
    }

    pub fn points(&self) -> &[LidarPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&LidarPoint> {
        self.points.get(index)
    }

    pub fn point_by_name(&self, name: &str) -> Option<&LidarPoint> {
        self.points.iter().find(|p| p.name() == name)
    }

    /// Sample every enabled point for a car at `position` facing `heading`.
    ///
    /// Results are committed only if every ray succeeded; on failure the
    /// previous readings stay in place.
    pub fn scan(&mut self, provider: &dyn RaycastProvider, position: Vec3, heading: Heading) -> Result<()> {
        let mut fresh = Vec::with_capacity(self.points.len());
        for (index, point) in self.points.iter().enumerate() {
            if !point.is_enabled() {
                continue;
            }
            let origin = point.config.origin(position, heading);
            fresh.push((index, origin, point.sample(provider, origin, heading)?));
        }

        for (index, origin, readings) in fresh {
            let point = &mut self.points[index];
            point.readings = readings;
            point.origin = origin;
            point.heading = heading;
        }
        debug!("Lidar scan complete for {} points", self.points.len());
        Ok(())
    }

    /// Smallest reading across every enabled point and mode, `None` if there
    /// are no readings at all.
    pub fn global_min_distance(&self) -> Option<f32> {
        self.points
            .iter()
            .filter(|p| p.is_enabled())
            .filter_map(|p| p.readings.min_distance())
            .reduce(f32::min)
    }

    pub fn report(&self) -> LidarReport {
        let points: Vec<LidarPointReport> = self
            .points
            .iter()
            .filter(|p| p.is_enabled())
            .map(|p| LidarPointReport {
                name: p.config.name.clone(),
                position: p.origin,
                heading: p.heading.degrees(),
                readings: p.readings.clone(),
            })
            .collect();

        LidarReport {
            point_count: points.len(),
            global_min_distance: self.global_min_distance(),
            points,
        }
    }
}

// ============================================================================
// BUILT-IN RAYCASTER
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: (f32, f32),
    b: (f32, f32),
}

#[inline]
fn cross(a: (f32, f32), b: (f32, f32)) -> f32 {
    a.0 * b.1 - a.1 * b.0
}

/// Casts horizontal rays against the maze walls, each wall taken as a thin
/// segment on the XZ plane around its cell's node position.
#[derive(Debug, Clone)]
pub struct WallGridRaycaster {
    segments: Vec<Segment>,
    floor: f32,
    wall_height: f32,
    half_thickness: f32,
}

impl WallGridRaycaster {
    pub fn new(maze: &Maze) -> Self {
        let layout = maze.layout().config();
        let half = layout.cell_size / 2.0;
        let data = maze.data();

        let mut segments = Vec::new();
        for node in maze.nodes().iter() {
            let at = CellRef::new(node.chunk, node.cell);
            let (cx, cz) = (node.world.x, node.world.z);
            for direction in Direction::ALL {
                if !data.has_wall(at, direction) {
                    continue;
                }
                let segment = match direction {
                    Direction::North => Segment { a: (cx - half, cz + half), b: (cx + half, cz + half) },
                    Direction::South => Segment { a: (cx - half, cz - half), b: (cx + half, cz - half) },
                    Direction::East => Segment { a: (cx + half, cz - half), b: (cx + half, cz + half) },
                    Direction::West => Segment { a: (cx - half, cz - half), b: (cx - half, cz + half) },
                };
                segments.push(segment);
            }
        }

        debug!("Raycaster built with {} wall segments", segments.len());
        Self {
            segments,
            floor: layout.wall_offset.y,
            wall_height: layout.wall_height,
            half_thickness: layout.wall_thickness / 2.0,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl RaycastProvider for WallGridRaycaster {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Result<Option<f32>> {
        let len = (direction.x * direction.x + direction.z * direction.z).sqrt();
        if !(len.is_finite() && len > f32::EPSILON) {
            return Err(MazeError::Raycast("ray has no horizontal direction".to_string()));
        }
        if origin.y < self.floor || origin.y > self.floor + self.wall_height {
            return Ok(None);
        }

        let d = (direction.x / len, direction.z / len);
        let o = (origin.x, origin.z);

        let nearest = self
            .segments
            .iter()
            .filter_map(|s| {
                let e = (s.b.0 - s.a.0, s.b.1 - s.a.1);
                let denom = cross(d, e);
                if denom.abs() < 1e-9 {
                    return None;
                }
                let ao = (s.a.0 - o.0, s.a.1 - o.1);
                let t = cross(ao, e) / denom;
                let u = cross(ao, d) / denom;
                (t >= 0.0 && (0.0..=1.0).contains(&u)).then_some(t)
            })
            .reduce(f32::min)
            .map(|t| (t - self.half_thickness).max(0.0));

        Ok(nearest.filter(|&t| t <= max_range))
    }
}
