//! Agent records and the fixed-capacity agent store
//!
//! Indices `[0, len)` are live. Removal swaps the last agent into the hole, so
//! an index taken before a removal may name a different agent afterwards.

use glam::Vec2;

use crate::error::{FlockError, Result};

/// Gameplay has marked this agent for removal at the next purge
pub const FLAG_REMOVE: u32 = 1 << 0;

/// A simulated boid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing angle (radians), eased toward the velocity heading
    pub rotation: f32,
    /// Scale factor applied to the configured base radius
    pub size: f32,
    /// Scale factor applied to the configured max speed
    pub speed_multiplier: f32,
    /// Kind group; same-kind neighbors may be skipped by alignment/cohesion
    pub kind: u32,
    /// Owned by gameplay; never read by the flocking core
    pub health: f32,
    /// Gameplay bookkeeping bits (see `FLAG_REMOVE`)
    pub flags: u32,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            rotation: 0.0,
            size: 1.0,
            speed_multiplier: 1.0,
            kind: 0,
            health: 1.0,
            flags: 0,
        }
    }
}

impl Agent {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            rotation: heading(vel).unwrap_or(0.0),
            ..Default::default()
        }
    }

    /// Build an agent from a spawner's request, facing its initial velocity
    pub fn from_request(request: &SpawnRequest) -> Self {
        Self {
            pos: request.pos,
            vel: request.vel,
            rotation: heading(request.vel).unwrap_or(0.0),
            size: request.size,
            speed_multiplier: request.speed_multiplier,
            kind: request.kind,
            health: request.health,
            flags: 0,
        }
    }

    /// Body radius given the radius of a size-1.0 agent
    #[inline]
    pub fn radius(&self, base_radius: f32) -> f32 {
        base_radius * self.size
    }

    /// Per-agent speed cap
    #[inline]
    pub fn max_speed(&self, base_max_speed: f32) -> f32 {
        base_max_speed * self.speed_multiplier
    }

    #[inline]
    pub fn is_marked_for_removal(&self) -> bool {
        self.flags & FLAG_REMOVE != 0
    }

    pub fn mark_for_removal(&mut self) {
        self.flags |= FLAG_REMOVE;
    }
}

/// Heading angle of a vector, or `None` for the zero vector
#[inline]
pub fn heading(v: Vec2) -> Option<f32> {
    if v == Vec2::ZERO {
        None
    } else {
        Some(v.y.atan2(v.x))
    }
}

/// What a spawning collaborator hands to the core
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: u32,
    pub size: f32,
    pub speed_multiplier: f32,
    pub health: f32,
}

impl Default for SpawnRequest {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            kind: 0,
            size: 1.0,
            speed_multiplier: 1.0,
            health: 1.0,
        }
    }
}

/// Densely packed, fixed-capacity agent collection
#[derive(Debug, Clone)]
pub struct AgentStore {
    agents: Vec<Agent>,
    capacity: usize,
}

impl AgentStore {
    /// Allocates the full capacity up front
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            agents: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Live agent count
    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.agents.len() >= self.capacity
    }

    /// Append an agent, returning its index. Rejected (and dropped) when full.
    pub fn insert(&mut self, agent: Agent) -> Result<usize> {
        if self.is_full() {
            return Err(FlockError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.agents.push(agent);
        Ok(self.agents.len() - 1)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Agent> {
        self.agents.get_mut(index)
    }

    /// O(1) removal; the last agent moves into `index`
    pub fn swap_remove(&mut self, index: usize) -> Option<Agent> {
        if index < self.agents.len() {
            Some(self.agents.swap_remove(index))
        } else {
            None
        }
    }

    /// Swap-remove every agent carrying `FLAG_REMOVE`. Returns how many were removed.
    pub fn purge_marked(&mut self) -> usize {
        let before = self.agents.len();
        let mut i = 0;
        while i < self.agents.len() {
            if self.agents[i].is_marked_for_removal() {
                // Re-check `i`: the swapped-in agent may be marked too
                self.agents.swap_remove(i);
            } else {
                i += 1;
            }
        }
        before - self.agents.len()
    }

    pub fn clear(&mut self) {
        self.agents.clear();
    }

    #[inline]
    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Agent> {
        self.agents.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.agents.iter().map(|a| a.pos)
    }
}

impl<'a> IntoIterator for &'a AgentStore {
    type Item = &'a Agent;
    type IntoIter = std::slice::Iter<'a, Agent>;

    fn into_iter(self) -> Self::IntoIter {
        self.agents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_at(x: f32) -> Agent {
        Agent::new(Vec2::new(x, 0.0), Vec2::ZERO)
    }

    #[test]
    fn test_insert_until_full() {
        let mut store = AgentStore::with_capacity(2);
        assert_eq!(store.insert(agent_at(0.0)).ok(), Some(0));
        assert_eq!(store.insert(agent_at(1.0)).ok(), Some(1));
        assert!(store.is_full());

        let err = store.insert(agent_at(2.0)).unwrap_err();
        assert!(matches!(err, FlockError::CapacityExceeded { capacity: 2 }));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_swap_remove_moves_last() {
        let mut store = AgentStore::with_capacity(4);
        for x in [0.0, 1.0, 2.0] {
            store.insert(agent_at(x)).unwrap();
        }
        let removed = store.swap_remove(0).unwrap();
        assert_eq!(removed.pos.x, 0.0);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().pos.x, 2.0);
        assert!(store.swap_remove(5).is_none());
    }

    #[test]
    fn test_purge_marked_handles_adjacent_marks() {
        let mut store = AgentStore::with_capacity(8);
        for x in 0..6 {
            let mut agent = agent_at(x as f32);
            if x == 1 || x == 4 || x == 5 {
                agent.mark_for_removal();
            }
            store.insert(agent).unwrap();
        }
        assert_eq!(store.purge_marked(), 3);
        let mut xs: Vec<f32> = store.positions().map(|p| p.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(xs, vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_request_faces_velocity() {
        let request = SpawnRequest {
            pos: Vec2::new(3.0, 4.0),
            vel: Vec2::new(0.0, 2.0),
            kind: 7,
            size: 2.0,
            ..Default::default()
        };
        let agent = Agent::from_request(&request);
        assert!((agent.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(agent.kind, 7);
        assert_eq!(agent.radius(4.0), 8.0);

        let still = Agent::from_request(&SpawnRequest::default());
        assert_eq!(still.rotation, 0.0);
    }

    #[test]
    fn test_heading_of_zero_is_none() {
        assert_eq!(heading(Vec2::ZERO), None);
        assert_eq!(heading(Vec2::X), Some(0.0));
    }
}
