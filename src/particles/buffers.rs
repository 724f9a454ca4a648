use log::trace;

use crate::engine::{NativeAddr, ParticleEngine};
use crate::math::{Color, ParticleColor, Vector2};

/// Host-side snapshots of one particle system's native buffers
///
/// Every system owns its own set. The snapshots are only as fresh as the last
/// refresh; reading them never touches the engine.
#[derive(Debug, Default, Clone)]
pub struct ParticleBuffers {
    /// Interleaved `x, y` pairs
    positions: Vec<f32>,
    velocities: Vec<Vector2>,
    colors: Vec<Color>,
    raw_colors: Vec<ParticleColor>,
}

impl ParticleBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the native position buffer, resizing the snapshot to the live count
    pub fn refresh_positions(&mut self, engine: &dyn ParticleEngine, system: NativeAddr) {
        let count = engine.particle_count(system).max(0) as usize;
        self.positions.resize(count * 2, 0.0);
        let written = engine.fill_position_buffer(system, &mut self.positions);
        self.positions.truncate(written * 2);
        trace!("refreshed {} positions from {:#x}", written, system.0);
    }

    pub fn refresh_velocities(&mut self, engine: &dyn ParticleEngine, system: NativeAddr) {
        engine.fill_velocity_buffer(system, &mut self.velocities);
        trace!("refreshed {} velocities from {:#x}", self.velocities.len(), system.0);
    }

    /// Copies the native color bytes and converts them to unit-interval floats
    pub fn refresh_colors(&mut self, engine: &dyn ParticleEngine, system: NativeAddr) {
        engine.fill_color_buffer(system, &mut self.raw_colors);
        self.colors.clear();
        self.colors.extend(self.raw_colors.iter().map(|&c| Color::from(c)));
        trace!("refreshed {} colors from {:#x}", self.colors.len(), system.0);
    }

    pub fn refresh_all(&mut self, engine: &dyn ParticleEngine, system: NativeAddr) {
        self.refresh_positions(engine, system);
        self.refresh_velocities(engine, system);
        self.refresh_colors(engine, system);
    }

    /// Interleaved positions from the last refresh
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector2] {
        &self.velocities
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Colors from the last refresh as the engine stores them
    pub fn raw_colors(&self) -> &[ParticleColor] {
        &self.raw_colors
    }
}
