//! Instance records for a drawing collaborator
//!
//! The core draws nothing. It packs live agents into plain `#[repr(C)]`
//! records that a renderer can upload as an instance buffer.

use bytemuck::{Pod, Zeroable};

use crate::sim::{Agent, AgentStore};

/// One agent as seen by a renderer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub position: [f32; 2],
    pub rotation: f32,
    /// Body radius in world units
    pub radius: f32,
    pub kind: u32,
    /// RGBA from the kind palette
    pub color: [f32; 4],
}

impl RenderInstance {
    pub fn from_agent(agent: &Agent, base_radius: f32) -> Self {
        Self {
            position: agent.pos.to_array(),
            rotation: agent.rotation,
            radius: agent.radius(base_radius),
            kind: agent.kind,
            color: colors::for_kind(agent.kind),
        }
    }

    /// Raw bytes for a GPU upload
    pub fn as_bytes(instances: &[RenderInstance]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}

/// Refill `out` with one instance per live agent, in store order
pub fn write_instances(store: &AgentStore, base_radius: f32, out: &mut Vec<RenderInstance>) {
    out.clear();
    out.extend(
        store
            .iter()
            .map(|agent| RenderInstance::from_agent(agent, base_radius)),
    );
}

/// Colors for agent kinds
pub mod colors {
    pub const PALETTE: [[f32; 4]; 4] = [
        [0.4, 0.7, 1.0, 1.0],
        [1.0, 0.4, 0.2, 1.0],
        [0.2, 0.8, 0.4, 1.0],
        [0.9, 0.85, 0.3, 1.0], // Gold/yellow
    ];

    /// Palette entry for a kind (wraps around)
    pub fn for_kind(kind: u32) -> [f32; 4] {
        PALETTE[kind as usize % PALETTE.len()]
    }
}
