//! Steering rules
//!
//! Every rule is a pure function of the subject agent, a read-only view of its
//! neighbours and the tuning parameters, returning a 2D force. Zero-length
//! directions produce zero force instead of NaN.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::grid::SpatialHashGrid;
use crate::tuning::{FlockConfig, RuleWeights};

/// Axis-aligned world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle centred on the origin
    pub fn centered(half_extents: Vec2) -> Self {
        Self::new(-half_extents, half_extents)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Nearest point inside (or on) the rectangle
    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    /// Rectangle moved inward by `margin` on every side (collapses to the centre
    /// if the margin is larger than half the extent)
    pub fn shrink(&self, margin: f32) -> Self {
        let center = self.center();
        Self::new(
            (self.min + Vec2::splat(margin)).min(center),
            (self.max - Vec2::splat(margin)).max(center),
        )
    }
}

/// Parameters the rules and integrator read; a flat copy of the relevant tuning values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringParams {
    pub max_speed: f32,
    pub max_force: f32,
    pub turn_speed: f32,
    pub alignment_radius: f32,
    pub cohesion_radius: f32,
    pub separation_margin: f32,
    pub agent_radius: f32,
    pub max_agent_size: f32,
    pub follow_interest_distance: f32,
    pub exclude_same_kind: bool,
    pub bounds: Bounds,
    pub contain_margin: f32,
    pub weights: RuleWeights,
}

impl SteeringParams {
    pub fn from_config(config: &FlockConfig) -> Self {
        Self {
            max_speed: config.max_speed,
            max_force: config.max_force,
            turn_speed: config.turn_speed,
            alignment_radius: config.alignment_radius,
            cohesion_radius: config.cohesion_radius,
            separation_margin: config.separation_margin,
            agent_radius: config.agent_radius,
            max_agent_size: config.max_agent_size,
            follow_interest_distance: config.follow_interest_distance,
            exclude_same_kind: config.exclude_same_kind,
            bounds: config.bounds,
            contain_margin: config.contain_margin,
            weights: config.weights,
        }
    }
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self::from_config(&FlockConfig::default())
    }
}

/// Read-only neighbour source: the tick's snapshot plus the grid built from it
#[derive(Clone, Copy)]
pub struct Neighborhood<'a> {
    pub agents: &'a [Agent],
    pub grid: &'a SpatialHashGrid<u32>,
}

impl<'a> Neighborhood<'a> {
    pub fn new(agents: &'a [Agent], grid: &'a SpatialHashGrid<u32>) -> Self {
        Self { agents, grid }
    }

    /// Visit every other agent within `radius` of agent `subject`, passing the
    /// neighbour and its squared distance
    pub fn for_each_within(&self, subject: usize, radius: f32, mut f: impl FnMut(&Agent, f32)) {
        let origin = self.agents[subject].pos;
        let radius_sq = radius * radius;
        let center = self.grid.cell_coord(origin);
        self.grid
            .for_each_in_neighborhood(center, self.grid.reach_for(radius), |idx| {
                let idx = idx as usize;
                if idx == subject {
                    return;
                }
                let other = &self.agents[idx];
                let dist_sq = origin.distance_squared(other.pos);
                if dist_sq <= radius_sq {
                    f(other, dist_sq);
                }
            });
    }
}

/// Steer from the current velocity toward `direction` at the agent's max speed
#[inline]
fn steer_toward(agent: &Agent, direction: Vec2, params: &SteeringParams) -> Vec2 {
    let dir = direction.normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec2::ZERO;
    }
    let desired = dir * agent.max_speed(params.max_speed);
    (desired - agent.vel).clamp_length_max(params.max_force)
}

/// Seek a target position, damped with distance when an interest distance is set
pub fn follow(agent: &Agent, target: Vec2, params: &SteeringParams) -> Vec2 {
    let offset = target - agent.pos;
    if offset == Vec2::ZERO {
        return Vec2::ZERO;
    }
    let force = steer_toward(agent, offset, params);
    let d0 = params.follow_interest_distance;
    if d0 > 0.0 {
        force * (d0 / (d0 + offset.length()))
    } else {
        force
    }
}

/// Whether a neighbour counts for alignment/cohesion
#[inline]
fn flock_mate(subject: &Agent, other: &Agent, params: &SteeringParams) -> bool {
    !(params.exclude_same_kind && subject.kind == other.kind)
}

/// Match the average heading of neighbours
pub fn alignment(subject: usize, hood: &Neighborhood<'_>, params: &SteeringParams) -> Vec2 {
    let agent = &hood.agents[subject];
    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    hood.for_each_within(subject, params.alignment_radius, |other, _| {
        if flock_mate(agent, other, params) {
            sum += other.vel;
            count += 1;
        }
    });
    if count == 0 {
        return Vec2::ZERO;
    }
    steer_toward(agent, sum / count as f32, params)
}

/// Move toward the centroid of neighbours
pub fn cohesion(subject: usize, hood: &Neighborhood<'_>, params: &SteeringParams) -> Vec2 {
    let agent = &hood.agents[subject];
    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    hood.for_each_within(subject, params.cohesion_radius, |other, _| {
        if flock_mate(agent, other, params) {
            sum += other.pos;
            count += 1;
        }
    });
    if count == 0 {
        return Vec2::ZERO;
    }
    steer_toward(agent, sum / count as f32 - agent.pos, params)
}

/// Push away from overlapping neighbours.
///
/// Each neighbour inside the contact distance (both radii plus margin) adds a
/// push of `(contact / dist)^2 - 1` along the separating direction: zero at
/// contact, growing with inverse squared distance. The average push is scaled
/// by `max_force` and clamped to it. Kind is ignored here: same-kind agents
/// still keep their distance.
///
/// The scan reach assumes no neighbour is larger than `max_agent_size`.
pub fn separation(subject: usize, hood: &Neighborhood<'_>, params: &SteeringParams) -> Vec2 {
    let agent = &hood.agents[subject];
    let own_radius = agent.radius(params.agent_radius);
    let reach =
        own_radius + params.agent_radius * params.max_agent_size + params.separation_margin;

    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    hood.for_each_within(subject, reach, |other, dist_sq| {
        // Coincident agents have no direction to separate along
        if dist_sq == 0.0 {
            return;
        }
        let contact = own_radius + other.radius(params.agent_radius) + params.separation_margin;
        let contact_sq = contact * contact;
        if dist_sq < contact_sq {
            let away = (agent.pos - other.pos) / dist_sq.sqrt();
            sum += away * (contact_sq / dist_sq - 1.0);
            count += 1;
        }
    });
    if count == 0 {
        return Vec2::ZERO;
    }
    (sum / count as f32 * params.max_force).clamp_length_max(params.max_force)
}

/// Steer back inside the bounds; zero while inside
pub fn contain(agent: &Agent, bounds: &Bounds, margin: f32, params: &SteeringParams) -> Vec2 {
    if bounds.contains(agent.pos) {
        return Vec2::ZERO;
    }
    let inner = bounds.shrink(margin);
    steer_toward(agent, inner.clamp(agent.pos) - agent.pos, params)
}

/// The closed set of steering rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SteeringRule {
    Follow,
    Contain,
    Alignment,
    Cohesion,
    Separation,
}

impl SteeringRule {
    pub const ALL: [SteeringRule; 5] = [
        SteeringRule::Follow,
        SteeringRule::Contain,
        SteeringRule::Alignment,
        SteeringRule::Cohesion,
        SteeringRule::Separation,
    ];

    pub fn weight(&self, weights: &RuleWeights) -> f32 {
        match self {
            SteeringRule::Follow => weights.follow,
            SteeringRule::Contain => weights.contain,
            SteeringRule::Alignment => weights.alignment,
            SteeringRule::Cohesion => weights.cohesion,
            SteeringRule::Separation => weights.separation,
        }
    }

    /// Unweighted force of this rule for agent `subject`
    pub fn force(
        &self,
        subject: usize,
        hood: &Neighborhood<'_>,
        target: Option<Vec2>,
        params: &SteeringParams,
    ) -> Vec2 {
        match self {
            SteeringRule::Follow => match target {
                Some(target) => follow(&hood.agents[subject], target, params),
                None => Vec2::ZERO,
            },
            SteeringRule::Contain => contain(
                &hood.agents[subject],
                &params.bounds,
                params.contain_margin,
                params,
            ),
            SteeringRule::Alignment => alignment(subject, hood, params),
            SteeringRule::Cohesion => cohesion(subject, hood, params),
            SteeringRule::Separation => separation(subject, hood, params),
        }
    }
}

/// Weighted sum of all rules; rules with zero weight are not evaluated
pub fn total_force(
    subject: usize,
    hood: &Neighborhood<'_>,
    target: Option<Vec2>,
    params: &SteeringParams,
) -> Vec2 {
    SteeringRule::ALL
        .iter()
        .filter_map(|rule| {
            let weight = rule.weight(&params.weights);
            (weight != 0.0).then(|| rule.force(subject, hood, target, params) * weight)
        })
        .sum()
}
