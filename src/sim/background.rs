//! Procedural parallax scenery
//!
//! Six layers scroll independently: far clouds, skyline, mid clouds,
//! buildings, trees and ground decoration, plus a small pool of banner
//! planes. Ground-anchored layers only move while playing and recycle in
//! place: an entity that leaves the left edge is re-rolled and appended
//! after the layer's current rightmost edge.

use glam::Vec2;
use rand::Rng;

use super::state::Cloud;
use crate::config::BG;
use crate::consts::{MAX_ACTIVE_PLANES, PLANE_POOL_SIZE};
use crate::{max_of, random_between};

const PLANE_ALT_MIN: f32 = 12.0;
const PLANE_ALT_MAX: f32 = 160.0;
/// Minimum vertical separation between live planes
const PLANE_ALT_SEP: f32 = 45.0;
const PLANE_ALT_ATTEMPTS: u32 = 20;
/// Off-screen distance planes enter from
const PLANE_ENTRY_OFFSET: f32 = 180.0;
/// Off-screen distance past which planes are retired
const PLANE_EXIT_OFFSET: f32 = 250.0;
const PLANE_INTERVAL_MIN_MS: f64 = 8000.0;
const PLANE_INTERVAL_SPREAD_MS: f64 = 15000.0;

/// Ambient drift multiplier for clouds/planes outside of play
const AMBIENT_MUL: f32 = 0.35;
/// Entities are recycled once their trailing edge is this far past x = 0
const RECYCLE_MARGIN: f32 = 20.0;

/// Horizontal spacing ranges between neighbours, per layer
const SKYLINE_GAP: f32 = 5.0;
const BUILDING_GAP: (f32, f32) = (15.0, 55.0);
const TREE_GAP: (f32, f32) = (20.0, 70.0);
const GROUND_DECO_GAP: (f32, f32) = (25.0, 60.0);

pub const DEFAULT_BANNER: &str = "Second Nature";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkylineCity {
    Phoenix,
    NewOrleans,
    Montreal,
    Dallas,
    Nashville,
}

impl SkylineCity {
    pub const ALL: [SkylineCity; 5] = [
        SkylineCity::Phoenix,
        SkylineCity::NewOrleans,
        SkylineCity::Montreal,
        SkylineCity::Dallas,
        SkylineCity::Nashville,
    ];

    /// (min, spread) of building heights for this city
    fn height_range(&self) -> (f32, f32) {
        match self {
            SkylineCity::Phoenix => (25.0, 35.0),
            SkylineCity::NewOrleans => (20.0, 30.0),
            SkylineCity::Montreal => (35.0, 50.0),
            SkylineCity::Dallas => (40.0, 55.0),
            SkylineCity::Nashville => (30.0, 40.0),
        }
    }

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkylineBuilding {
    /// Offset from the segment's x
    pub ox: f32,
    pub w: f32,
    pub h: f32,
    pub has_spire: bool,
    pub has_dome: bool,
    pub has_cactus: bool,
}

/// A run of silhouettes from one city
#[derive(Debug, Clone, PartialEq)]
pub struct SkylineSegment {
    pub x: f32,
    pub ground_y: f32,
    pub city: SkylineCity,
    pub buildings: Vec<SkylineBuilding>,
    pub total_w: f32,
    pub speed: f32,
}

impl SkylineSegment {
    fn generate<R: Rng + ?Sized>(city: SkylineCity, x: f32, ground_y: f32, rng: &mut R) -> Self {
        let mut seg = Self {
            x,
            ground_y,
            city,
            buildings: Vec::with_capacity(6),
            total_w: 0.0,
            speed: BG.far_speed,
        };
        seg.regenerate(city, rng);
        seg
    }

    /// Re-roll the silhouettes in place, reusing the buildings buffer
    fn regenerate<R: Rng + ?Sized>(&mut self, city: SkylineCity, rng: &mut R) {
        self.city = city;
        self.buildings.clear();

        let (h_min, h_spread) = city.height_range();
        let count = 3 + rng.random_range(0..4);
        let mut cx = 0.0;
        for _ in 0..count {
            let w = random_between(rng, 12.0, 34.0);
            let h = random_between(rng, h_min, h_min + h_spread);
            self.buildings.push(SkylineBuilding {
                ox: cx,
                w,
                h,
                has_spire: rng.random_bool(0.2),
                has_dome: city == SkylineCity::Montreal && rng.random_bool(0.15),
                has_cactus: city == SkylineCity::Phoenix && rng.random_bool(0.25),
            });
            cx += w + random_between(rng, 2.0, 8.0);
        }
        self.total_w = cx;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingType {
    House,
    Apartment,
    Office,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Building {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub kind: BuildingType,
    pub windows: u32,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeType {
    Pine,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tree {
    pub x: f32,
    /// Ground line the trunk stands on
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub kind: TreeType,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundDecoKind {
    Dash,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundDeco {
    pub x: f32,
    pub kind: GroundDecoKind,
    pub speed: f32,
}

/// A banner-towing plane
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plane {
    pub pos: Vec2,
    /// +1 flying right, -1 flying left
    pub dir: f32,
    pub banner_text: String,
    pub banner_w: f32,
    /// Phase offset for the renderer's bobbing
    pub wobble: f32,
    pub speed: f32,
}

/// All scrolling layers plus the rightmost-edge tracker of each recycled layer
#[derive(Debug, Clone, Default)]
pub struct BgLayers {
    pub far_clouds: Vec<Cloud>,
    pub skyline: Vec<SkylineSegment>,
    pub mid_clouds: Vec<Cloud>,
    pub buildings: Vec<Building>,
    pub trees: Vec<Tree>,
    pub ground_deco: Vec<GroundDeco>,
    pub max_right_skyline: f32,
    pub max_right_buildings: f32,
    pub max_right_trees: f32,
    pub max_right_ground_deco: f32,
}

/// Values the background needs from the game config
#[derive(Debug, Clone)]
pub struct BackgroundDeps {
    pub width: f32,
    pub height: f32,
    pub ground_h: f32,
    /// Shared speed reference so scenery and pipes move coherently
    pub pipe_speed: f32,
    pub banner_texts: Vec<String>,
    /// Freeze ambient drift and planes outside of play
    pub reduced_motion: bool,
}

#[derive(Debug, Clone)]
pub struct Background {
    pub layers: BgLayers,
    pub planes: [Plane; PLANE_POOL_SIZE],
    pub plane_count: usize,
    next_plane_time: f64,
    deps: BackgroundDeps,
}

impl Background {
    pub fn new(deps: BackgroundDeps) -> Self {
        Self {
            layers: BgLayers::default(),
            planes: Default::default(),
            plane_count: 0,
            next_plane_time: 0.0,
            deps,
        }
    }

    pub fn pipe_speed(&self) -> f32 {
        self.deps.pipe_speed
    }

    /// Follow a pipe speed change without rebuilding the layers
    pub fn set_pipe_speed(&mut self, pipe_speed: f32) {
        self.deps.pipe_speed = pipe_speed;
    }

    pub fn active_planes(&self) -> &[Plane] {
        &self.planes[..self.plane_count]
    }

    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.deps.reduced_motion = reduced_motion;
    }

    /// Populate every layer slightly past the viewport and launch the first plane
    pub fn init<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) {
        let width = self.deps.width;
        let ground_y = self.deps.height - self.deps.ground_h;
        let mut layers = BgLayers::default();

        for _ in 0..3 {
            layers.far_clouds.push(Cloud {
                pos: Vec2::new(
                    rng.random::<f32>() * width * 1.5,
                    random_between(rng, 15.0, 75.0),
                ),
                w: random_between(rng, 70.0, 150.0),
                speed: BG.far_speed,
            });
        }

        let mut sx = -50.0;
        while sx < width + BG.skyline_seg_w {
            let seg = SkylineSegment::generate(SkylineCity::random(rng), sx, ground_y, rng);
            // Guard against a zero-width segment stalling the fill
            sx += seg.total_w.max(1.0);
            layers.skyline.push(seg);
        }

        for _ in 0..3 {
            layers.mid_clouds.push(Cloud {
                pos: Vec2::new(
                    rng.random::<f32>() * width * 1.3,
                    random_between(rng, 60.0, 160.0),
                ),
                w: random_between(rng, 35.0, 80.0),
                speed: BG.mid_speed,
            });
        }

        let mut bx = -30.0;
        while bx < width + 80.0 {
            let w = random_between(rng, BG.building_min_w, BG.building_max_w);
            let h = random_between(rng, 30.0, 90.0);
            layers.buildings.push(Building {
                x: bx,
                y: ground_y - h,
                w,
                h,
                kind: random_building_type(rng, 0.7),
                windows: rng.random_range(1..=4),
                speed: BG.mid_speed,
            });
            bx += w + random_between(rng, BUILDING_GAP.0, BUILDING_GAP.1);
        }

        let mut tx = 10.0;
        while tx < width + 40.0 {
            let w = random_between(rng, BG.tree_min_w, BG.tree_max_w);
            layers.trees.push(Tree {
                x: tx,
                y: ground_y,
                w,
                h: w * random_between(rng, 1.5, 2.5),
                kind: random_tree_type(rng),
                speed: BG.near_speed,
            });
            tx += w + random_between(rng, TREE_GAP.0, TREE_GAP.1);
        }

        let mut gx = 0.0;
        while gx < width + 30.0 {
            layers.ground_deco.push(GroundDeco {
                x: gx,
                kind: random_deco_kind(rng),
                speed: BG.near_speed,
            });
            gx += random_between(rng, GROUND_DECO_GAP.0, GROUND_DECO_GAP.1);
        }

        layers.max_right_skyline = max_of(&layers.skyline, |s| s.x + s.total_w);
        layers.max_right_buildings = max_of(&layers.buildings, |b| b.x + b.w);
        layers.max_right_trees = max_of(&layers.trees, |t| t.x + t.w);
        layers.max_right_ground_deco = max_of(&layers.ground_deco, |g| g.x);
        self.layers = layers;

        self.planes = Default::default();
        self.plane_count = 0;
        self.spawn_plane(now, rng);

        log::debug!(
            "Background ready: {} skyline, {} buildings, {} trees, {} deco",
            self.layers.skyline.len(),
            self.layers.buildings.len(),
            self.layers.trees.len(),
            self.layers.ground_deco.len()
        );
    }

    /// Launch a plane at a free altitude; no-op when the pool is full
    pub fn spawn_plane<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) {
        if self.plane_count >= self.planes.len() {
            return;
        }

        let banner = if self.deps.banner_texts.is_empty() {
            DEFAULT_BANNER
        } else {
            self.deps.banner_texts[rng.random_range(0..self.deps.banner_texts.len())].as_str()
        };

        let mut y;
        let mut attempts = 0;
        loop {
            y = random_between(rng, PLANE_ALT_MIN, PLANE_ALT_MAX);
            attempts += 1;
            if attempts >= PLANE_ALT_ATTEMPTS || !self.plane_alt_conflict(y) {
                break;
            }
        }

        let going_right = rng.random_bool(0.5);
        let width = self.deps.width;
        let p = &mut self.planes[self.plane_count];
        p.pos = Vec2::new(
            if going_right {
                -PLANE_ENTRY_OFFSET
            } else {
                width + PLANE_ENTRY_OFFSET
            },
            y,
        );
        p.dir = if going_right { 1.0 } else { -1.0 };
        p.banner_text = banner.to_string();
        p.banner_w = p.banner_text.chars().count() as f32 * 6.5 + 24.0;
        p.wobble = rng.random::<f32>() * 1000.0;
        p.speed = BG.plane_speed;
        self.plane_count += 1;

        self.next_plane_time =
            now + PLANE_INTERVAL_MIN_MS + rng.random::<f64>() * PLANE_INTERVAL_SPREAD_MS;
        log::debug!("Plane spawned at y={y:.0}");
    }

    fn plane_alt_conflict(&self, y: f32) -> bool {
        self.active_planes()
            .iter()
            .any(|p| (p.pos.y - y).abs() < PLANE_ALT_SEP)
    }

    /// Advance one tick
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, now: f64, is_playing: bool, rng: &mut R) {
        let dt = dt.max(0.0);
        let width = self.deps.width;
        let speed_ref = self.deps.pipe_speed;
        let ambient_mul = match (is_playing, self.deps.reduced_motion) {
            (true, _) => 1.0,
            (false, false) => AMBIENT_MUL,
            (false, true) => 0.0,
        };

        for c in &mut self.layers.far_clouds {
            c.pos.x -= c.speed * speed_ref * dt * ambient_mul;
            if c.pos.x + c.w < -RECYCLE_MARGIN {
                c.pos.x = width + random_between(rng, 20.0, 80.0);
                c.pos.y = random_between(rng, 15.0, 75.0);
            }
        }

        for c in &mut self.layers.mid_clouds {
            c.pos.x -= c.speed * speed_ref * dt * ambient_mul;
            if c.pos.x + c.w < -RECYCLE_MARGIN {
                c.pos.x = width + random_between(rng, 20.0, 60.0);
                c.pos.y = random_between(rng, 60.0, 160.0);
            }
        }

        for i in (0..self.plane_count).rev() {
            let p = &mut self.planes[i];
            p.pos.x += p.dir * p.speed * speed_ref * dt * ambient_mul;
            let gone_right = p.dir > 0.0 && p.pos.x > width + PLANE_EXIT_OFFSET + p.banner_w;
            let gone_left = p.dir < 0.0 && p.pos.x < -PLANE_EXIT_OFFSET - p.banner_w;
            if gone_right || gone_left {
                let last = self.plane_count - 1;
                self.planes.swap(i, last);
                self.plane_count -= 1;
            }
        }
        if ambient_mul > 0.0 && now > self.next_plane_time && self.plane_count < MAX_ACTIVE_PLANES {
            self.spawn_plane(now, rng);
        }

        if !is_playing {
            return;
        }

        let sky_shift = BG.far_speed * speed_ref * dt;
        let mid_shift = BG.mid_speed * speed_ref * dt;
        let near_shift = BG.near_speed * speed_ref * dt;
        let ground_y = self.deps.height - self.deps.ground_h;
        let layers = &mut self.layers;
        layers.max_right_skyline -= sky_shift;
        layers.max_right_buildings -= mid_shift;
        layers.max_right_trees -= near_shift;
        layers.max_right_ground_deco -= near_shift;

        for seg in &mut layers.skyline {
            seg.x -= sky_shift;
            if seg.x + seg.total_w < -RECYCLE_MARGIN {
                seg.regenerate(SkylineCity::random(rng), rng);
                seg.x = layers.max_right_skyline + SKYLINE_GAP;
                layers.max_right_skyline = seg.x + seg.total_w;
            }
        }

        for b in &mut layers.buildings {
            b.x -= mid_shift;
            if b.x + b.w < -RECYCLE_MARGIN {
                b.x = layers.max_right_buildings + random_between(rng, BUILDING_GAP.0, BUILDING_GAP.1);
                b.h = random_between(rng, 30.0, 90.0);
                b.y = ground_y - b.h;
                b.kind = random_building_type(rng, 0.65);
                b.windows = rng.random_range(1..=4);
                layers.max_right_buildings = b.x + b.w;
            }
        }

        for t in &mut layers.trees {
            t.x -= near_shift;
            if t.x + t.w < -RECYCLE_MARGIN {
                t.x = layers.max_right_trees + random_between(rng, TREE_GAP.0, TREE_GAP.1);
                t.w = random_between(rng, BG.tree_min_w, BG.tree_max_w);
                t.h = t.w * random_between(rng, 1.5, 2.5);
                t.kind = random_tree_type(rng);
                layers.max_right_trees = t.x + t.w;
            }
        }

        for g in &mut layers.ground_deco {
            g.x -= near_shift;
            if g.x < -10.0 {
                g.x = layers.max_right_ground_deco + random_between(rng, GROUND_DECO_GAP.0, GROUND_DECO_GAP.1);
                layers.max_right_ground_deco = g.x;
            }
        }
    }
}

/// House below 0.4, apartment below `apartment_cut`, office above
fn random_building_type<R: Rng + ?Sized>(rng: &mut R, apartment_cut: f32) -> BuildingType {
    let roll = rng.random::<f32>();
    if roll < 0.4 {
        BuildingType::House
    } else if roll < apartment_cut {
        BuildingType::Apartment
    } else {
        BuildingType::Office
    }
}

fn random_tree_type<R: Rng + ?Sized>(rng: &mut R) -> TreeType {
    if rng.random_bool(0.3) {
        TreeType::Pine
    } else {
        TreeType::Round
    }
}

fn random_deco_kind<R: Rng + ?Sized>(rng: &mut R) -> GroundDecoKind {
    if rng.random_bool(0.5) {
        GroundDecoKind::Dash
    } else {
        GroundDecoKind::Dot
    }
}
