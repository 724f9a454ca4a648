use std::collections::{BTreeMap, HashMap};
use log::{debug, trace, warn};

use crate::core::ParticleSystemDef;
use crate::engine::{
    NativeAddr, ParticleEngine, RawDestroyedParticle, RawGroupDef, RawParticleDef, StepReport,
    INVALID_PARTICLE_INDEX,
};
use crate::math::{ColorChannel, ParticleColor, Transform2, Vector2};
use crate::particles::{ParticleFlags, ParticleGroupFlags};
use crate::shapes::Shape;

/// Grid spacing of procedurally filled groups, in particle diameters
const PARTICLE_STRIDE: f32 = 0.75;

/// First address handed out; leaves the low range free so `NULL` never collides
const BASE_ADDRESS: u64 = 0x1000;

/// Alignment between consecutive addresses
const ADDRESS_STEP: u64 = 0x10;

#[derive(Debug, Clone)]
struct GroupRecord {
    flags: ParticleGroupFlags,
    strength: f32,
}

/// Per-system state, stored as parallel per-particle arrays
#[derive(Debug)]
struct SoftwareSystem {
    def: ParticleSystemDef,
    radius: f32,
    density: f32,
    gravity_scale: f32,
    damping: f32,
    max_count: i32,
    paused: bool,

    /// Elapsed simulated time, used for lifetimes
    time: f32,

    /// Creation counter, used to rank particles by age
    next_sequence: u64,

    positions: Vec<Vector2>,
    velocities: Vec<Vector2>,
    colors: Vec<ParticleColor>,
    flags: Vec<ParticleFlags>,
    expirations: Vec<Option<f32>>,
    sequences: Vec<u64>,
    memberships: Vec<NativeAddr>,

    groups: BTreeMap<NativeAddr, GroupRecord>,
}

fn permute<T: Clone>(values: &mut Vec<T>, order: &[usize]) {
    let reordered: Vec<T> = order.iter().map(|&i| values[i].clone()).collect();
    *values = reordered;
}

fn compact<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut cursor = 0;
    values.retain(|_| {
        let kept = keep[cursor];
        cursor += 1;
        kept
    });
}

impl SoftwareSystem {
    fn new(def: &ParticleSystemDef) -> Self {
        Self {
            def: def.clone(),
            radius: def.radius,
            density: def.density,
            gravity_scale: def.gravity_scale,
            damping: def.damping_strength,
            max_count: i32::try_from(def.max_count).unwrap_or(i32::MAX),
            paused: false,
            time: 0.0,
            next_sequence: 0,
            positions: Vec::new(),
            velocities: Vec::new(),
            colors: Vec::new(),
            flags: Vec::new(),
            expirations: Vec::new(),
            sequences: Vec::new(),
            memberships: Vec::new(),
            groups: BTreeMap::new(),
        }
    }

    fn count(&self) -> usize {
        self.positions.len()
    }

    /// Particles the system can still take; bounded by the `i32` index range when unlimited
    fn room(&self) -> usize {
        let max = if self.max_count > 0 { self.max_count } else { i32::MAX };
        (max as usize).saturating_sub(self.count())
    }

    fn has_room(&self, additional: usize) -> bool {
        additional <= self.room()
    }

    fn index(&self, index: i32) -> Option<usize> {
        usize::try_from(index).ok().filter(|&i| i < self.count())
    }

    fn expiration_for(&self, lifetime: f32) -> Option<f32> {
        if !(lifetime > 0.0) || !lifetime.is_finite() {
            return None;
        }
        let granularity = self.def.lifetime_granularity;
        let quantized = if granularity > 0.0 {
            (lifetime / granularity).ceil() * granularity
        } else {
            lifetime
        };
        Some(self.time + quantized)
    }

    fn push_particle(
        &mut self,
        flags: ParticleFlags,
        position: Vector2,
        velocity: Vector2,
        color: ParticleColor,
        lifetime: f32,
        group: NativeAddr,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.positions.push(position);
        self.velocities.push(velocity);
        self.colors.push(color);
        self.flags.push(flags);
        self.expirations.push(self.expiration_for(lifetime));
        self.sequences.push(sequence);
        self.memberships.push(group);
        sequence
    }

    fn mark_zombie(&mut self, index: usize, call_listener: bool) {
        let flags = &mut self.flags[index];
        *flags |= ParticleFlags::ZOMBIE;
        if call_listener {
            *flags |= ParticleFlags::DESTRUCTION_LISTENER;
        }
    }

    fn members(&self, group: NativeAddr) -> Vec<usize> {
        self.memberships
            .iter()
            .enumerate()
            .filter(|(_, &m)| m == group)
            .map(|(i, _)| i)
            .collect()
    }

    fn apply_order(&mut self, order: &[usize]) {
        permute(&mut self.positions, order);
        permute(&mut self.velocities, order);
        permute(&mut self.colors, order);
        permute(&mut self.flags, order);
        permute(&mut self.expirations, order);
        permute(&mut self.sequences, order);
        permute(&mut self.memberships, order);
    }

    /// Rotates the buffers so the group's particles occupy one contiguous range
    /// starting at its first member. Relative order is preserved otherwise.
    fn make_contiguous(&mut self, group: NativeAddr) {
        let members = self.members(group);
        let (Some(&first), Some(&last)) = (members.first(), members.last()) else {
            return;
        };
        if last - first + 1 == members.len() {
            return;
        }

        let count = self.count();
        let mut order = Vec::with_capacity(count);
        order.extend(0..first);
        order.extend(members.iter().copied());
        order.extend((first..count).filter(|&i| self.memberships[i] != group));
        self.apply_order(&order);
    }

    /// Particle positions for a group, in the group's local frame
    ///
    /// At most `limit` points are produced. Returns `None` when a procedural
    /// fill would need more grid cells than a buffer can index.
    fn fill_points(&self, def: &RawGroupDef<'_>, limit: usize) -> Option<Vec<Vector2>> {
        if let Some(points) = def.position_data {
            return Some(points.to_vec());
        }
        let Some(shape) = def.shape else {
            return Some(Vec::new());
        };

        let stride = if def.stride > 0.0 {
            def.stride
        } else {
            PARTICLE_STRIDE * 2.0 * self.radius
        };
        if !(stride > 0.0) {
            return Some(Vec::new());
        }

        let identity = Transform2::identity();
        let aabb = shape.compute_aabb(&identity);
        let x0 = (aabb.min.x / stride).floor() * stride;
        let y0 = (aabb.min.y / stride).floor() * stride;
        let columns = ((f64::from(aabb.max.x) - f64::from(x0)) / f64::from(stride)).ceil();
        let rows = ((f64::from(aabb.max.y) - f64::from(y0)) / f64::from(stride)).ceil();
        if !(columns * rows).is_finite() {
            return None;
        }
        if columns <= 0.0 || rows <= 0.0 {
            return Some(Vec::new());
        }
        if columns * rows > f64::from(i32::MAX) {
            return None;
        }

        let limit = match def.particle_count {
            0 => limit,
            requested => requested.min(limit),
        };
        let mut points = Vec::new();
        if limit == 0 {
            return Some(points);
        }
        for j in 0..rows as u32 {
            let y = y0 + j as f32 * stride;
            for i in 0..columns as u32 {
                let p = Vector2::new(x0 + i as f32 * stride, y);
                if shape.test_point(&identity, p) {
                    points.push(p);
                    if points.len() == limit {
                        return Some(points);
                    }
                }
            }
        }
        Some(points)
    }

    fn step(&mut self, time_step: f32, gravity: Vector2) -> StepReport {
        if self.paused {
            return StepReport::default();
        }
        self.time += time_step;

        if self.def.destroy_by_age {
            let now = self.time;
            for (flags, expiration) in self.flags.iter_mut().zip(&self.expirations) {
                if matches!(expiration, Some(t) if *t <= now) {
                    *flags |= ParticleFlags::ZOMBIE;
                }
            }
        }

        let dv = gravity * (self.gravity_scale * time_step);
        for i in 0..self.count() {
            if self.flags[i].intersects(ParticleFlags::WALL | ParticleFlags::ZOMBIE) {
                continue;
            }
            self.velocities[i] += dv;
            let v = self.velocities[i];
            self.positions[i] += v * time_step;
        }

        let mut report = StepReport::default();

        let keep: Vec<bool> = self
            .flags
            .iter()
            .map(|f| !f.contains(ParticleFlags::ZOMBIE))
            .collect();
        if keep.iter().any(|k| !k) {
            for (i, flags) in self.flags.iter().enumerate() {
                if flags.contains(ParticleFlags::ZOMBIE | ParticleFlags::DESTRUCTION_LISTENER) {
                    report.destroyed_particles.push(RawDestroyedParticle {
                        index: i as i32,
                        flags: flags.bits(),
                        position: self.positions[i],
                    });
                }
            }

            compact(&mut self.positions, &keep);
            compact(&mut self.velocities, &keep);
            compact(&mut self.colors, &keep);
            compact(&mut self.flags, &keep);
            compact(&mut self.expirations, &keep);
            compact(&mut self.sequences, &keep);
            compact(&mut self.memberships, &keep);
        }

        for (addr, record) in &self.groups {
            let empty = !self.memberships.contains(addr);
            let doomed = record.flags.contains(ParticleGroupFlags::WILL_BE_DESTROYED)
                || (empty && !record.flags.contains(ParticleGroupFlags::CAN_BE_EMPTY));
            if doomed {
                report.destroyed_groups.push(*addr);
            }
        }
        for addr in &report.destroyed_groups {
            self.groups.remove(addr);
            for membership in self.memberships.iter_mut().filter(|m| **m == *addr) {
                *membership = NativeAddr::NULL;
            }
        }

        report
    }
}

/// An in-process engine that honours the [`ParticleEngine`] contract
///
/// It keeps the bookkeeping a real engine has to get right (deferred removal,
/// compaction, age ranking, lifetimes, group membership and capacity) and moves
/// particles ballistically under gravity. There is no particle-particle
/// interaction.
#[derive(Debug)]
pub struct SoftwareEngine {
    next_address: u64,
    systems: HashMap<NativeAddr, SoftwareSystem>,
}

impl Default for SoftwareEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareEngine {
    /// Creates an engine with no systems
    pub fn new() -> Self {
        Self {
            next_address: BASE_ADDRESS,
            systems: HashMap::new(),
        }
    }

    fn allocate(&mut self) -> NativeAddr {
        let addr = NativeAddr(self.next_address);
        self.next_address += ADDRESS_STEP;
        addr
    }

    fn system(&self, system: NativeAddr) -> Option<&SoftwareSystem> {
        self.systems.get(&system)
    }

    fn system_mut(&mut self, system: NativeAddr) -> Option<&mut SoftwareSystem> {
        let found = self.systems.get_mut(&system);
        if found.is_none() {
            warn!("unknown particle system address {:#x}", system.0);
        }
        found
    }
}

impl ParticleEngine for SoftwareEngine {
    fn version_string(&self) -> String {
        format!("software particle engine {}", crate::VERSION)
    }

    fn create_system(&mut self, def: &ParticleSystemDef) -> NativeAddr {
        let addr = self.allocate();
        self.systems.insert(addr, SoftwareSystem::new(def));
        debug!("created particle system at {:#x}", addr.0);
        addr
    }

    fn destroy_system(&mut self, system: NativeAddr) {
        if self.systems.remove(&system).is_some() {
            debug!("destroyed particle system at {:#x}", system.0);
        } else {
            warn!("destroy of unknown particle system {:#x}", system.0);
        }
    }

    fn create_particle(&mut self, system: NativeAddr, def: &RawParticleDef) -> i32 {
        let Some(sys) = self.system_mut(system) else {
            return INVALID_PARTICLE_INDEX;
        };
        if !sys.has_room(1) {
            return INVALID_PARTICLE_INDEX;
        }

        let group = if def.group.is_null() || sys.groups.contains_key(&def.group) {
            def.group
        } else {
            warn!("particle added to unknown group {:#x}, creating it ungrouped", def.group.0);
            NativeAddr::NULL
        };

        let sequence = sys.push_particle(
            ParticleFlags::from_bits_retain(def.flags),
            def.position,
            def.velocity,
            def.color,
            def.lifetime,
            group,
        );
        if !group.is_null() {
            sys.make_contiguous(group);
        }

        sys.sequences
            .iter()
            .position(|&s| s == sequence)
            .map_or(INVALID_PARTICLE_INDEX, |i| i as i32)
    }

    fn destroy_particle(&mut self, system: NativeAddr, index: i32, call_listener: bool) {
        let Some(sys) = self.system_mut(system) else {
            return;
        };
        match sys.index(index) {
            Some(i) => sys.mark_zombie(i, call_listener),
            None => warn!("destroy of particle {} outside buffer of {}", index, sys.count()),
        }
    }

    fn destroy_oldest_particle(&mut self, system: NativeAddr, rank: i32, call_listener: bool) {
        let Some(sys) = self.system_mut(system) else {
            return;
        };
        let Ok(rank) = usize::try_from(rank) else {
            return;
        };

        let mut live: Vec<usize> = (0..sys.count())
            .filter(|&i| !sys.flags[i].contains(ParticleFlags::ZOMBIE))
            .collect();
        live.sort_by_key(|&i| sys.sequences[i]);

        if let Some(&index) = live.get(rank) {
            sys.mark_zombie(index, call_listener);
        }
    }

    fn destroy_particles_in_shape(
        &mut self,
        system: NativeAddr,
        shape: &dyn Shape,
        transform: &Transform2,
        call_listener: bool,
    ) -> i32 {
        let Some(sys) = self.system_mut(system) else {
            return 0;
        };

        let mut destroyed = 0;
        for i in 0..sys.count() {
            if sys.flags[i].contains(ParticleFlags::ZOMBIE) {
                continue;
            }
            if shape.test_point(transform, sys.positions[i]) {
                sys.mark_zombie(i, call_listener);
                destroyed += 1;
            }
        }
        destroyed
    }

    fn create_group(&mut self, system: NativeAddr, def: &RawGroupDef<'_>) -> NativeAddr {
        let new_addr = if def.group.is_null() { Some(self.allocate()) } else { None };
        let Some(sys) = self.system_mut(system) else {
            return NativeAddr::NULL;
        };

        // Stops one point past the room
        let Some(local) = sys.fill_points(def, sys.room().saturating_add(1)) else {
            warn!("group fill grid is too large to index");
            return NativeAddr::NULL;
        };
        if !sys.has_room(local.len()) {
            warn!(
                "group of {} particles does not fit: {} live, max {}",
                local.len(),
                sys.count(),
                sys.max_count
            );
            return NativeAddr::NULL;
        }

        let target = match new_addr {
            Some(addr) => {
                sys.groups.insert(
                    addr,
                    GroupRecord {
                        flags: ParticleGroupFlags::from_bits_retain(def.group_flags),
                        strength: def.strength,
                    },
                );
                addr
            }
            None if sys.groups.contains_key(&def.group) => def.group,
            None => {
                warn!("extension of unknown group {:#x}", def.group.0);
                return NativeAddr::NULL;
            }
        };

        let transform = Transform2::new(def.position, def.angle);
        let flags = ParticleFlags::from_bits_retain(def.flags);
        for p in &local {
            let placed = transform.transform_point(*p);
            let spin = Vector2::cross_scalar(def.angular_velocity, placed - def.position);
            let velocity = def.linear_velocity + spin;
            sys.push_particle(flags, placed, velocity, def.color, def.lifetime, target);
        }
        if new_addr.is_none() {
            sys.make_contiguous(target);
        }

        trace!("group {:#x} received {} particles", target.0, local.len());
        target
    }

    fn join_groups(&mut self, system: NativeAddr, a: NativeAddr, b: NativeAddr) {
        let Some(sys) = self.system_mut(system) else {
            return;
        };
        if a == b || !sys.groups.contains_key(&a) {
            warn!("invalid join of {:#x} and {:#x}", a.0, b.0);
            return;
        }
        let Some(absorbed) = sys.groups.remove(&b) else {
            warn!("join with unknown group {:#x}", b.0);
            return;
        };

        for membership in sys.memberships.iter_mut().filter(|m| **m == b) {
            *membership = a;
        }
        if let Some(record) = sys.groups.get_mut(&a) {
            record.flags |= absorbed.flags;
        }
        sys.make_contiguous(a);
    }

    fn destroy_group_particles(
        &mut self,
        system: NativeAddr,
        group: NativeAddr,
        call_listener: bool,
    ) {
        let Some(sys) = self.system_mut(system) else {
            return;
        };
        for i in sys.members(group) {
            sys.mark_zombie(i, call_listener);
        }
    }

    fn group_particle_count(&self, system: NativeAddr, group: NativeAddr) -> i32 {
        self.system(system)
            .map_or(0, |s| s.memberships.iter().filter(|&&m| m == group).count() as i32)
    }

    fn group_buffer_index(&self, system: NativeAddr, group: NativeAddr) -> i32 {
        self.system(system).map_or(0, |s| {
            s.memberships
                .iter()
                .position(|&m| m == group)
                .unwrap_or(s.count()) as i32
        })
    }

    fn group_flags(&self, system: NativeAddr, group: NativeAddr) -> u32 {
        self.system(system)
            .and_then(|s| s.groups.get(&group))
            .map_or(0, |g| g.flags.bits())
    }

    fn set_group_flags(&mut self, system: NativeAddr, group: NativeAddr, flags: u32) {
        if let Some(record) = self.system_mut(system).and_then(|s| s.groups.get_mut(&group)) {
            record.flags = ParticleGroupFlags::from_bits_retain(flags);
        }
    }

    fn group_strength(&self, system: NativeAddr, group: NativeAddr) -> f32 {
        self.system(system)
            .and_then(|s| s.groups.get(&group))
            .map_or(0.0, |g| g.strength)
    }

    fn particle_count(&self, system: NativeAddr) -> i32 {
        self.system(system).map_or(0, |s| s.count() as i32)
    }

    fn group_count(&self, system: NativeAddr) -> i32 {
        self.system(system).map_or(0, |s| s.groups.len() as i32)
    }

    fn radius(&self, system: NativeAddr) -> f32 {
        self.system(system).map_or(0.0, |s| s.radius)
    }

    fn set_radius(&mut self, system: NativeAddr, radius: f32) {
        if let Some(s) = self.system_mut(system) {
            s.radius = radius;
        }
    }

    fn density(&self, system: NativeAddr) -> f32 {
        self.system(system).map_or(0.0, |s| s.density)
    }

    fn set_density(&mut self, system: NativeAddr, density: f32) {
        if let Some(s) = self.system_mut(system) {
            s.density = density;
        }
    }

    fn gravity_scale(&self, system: NativeAddr) -> f32 {
        self.system(system).map_or(0.0, |s| s.gravity_scale)
    }

    fn set_gravity_scale(&mut self, system: NativeAddr, scale: f32) {
        if let Some(s) = self.system_mut(system) {
            s.gravity_scale = scale;
        }
    }

    fn max_particle_count(&self, system: NativeAddr) -> i32 {
        self.system(system).map_or(0, |s| s.max_count)
    }

    fn set_max_particle_count(&mut self, system: NativeAddr, count: i32) {
        let Some(s) = self.system_mut(system) else {
            return;
        };
        if count < 0 || (count > 0 && (count as usize) < s.count()) {
            warn!("rejected max particle count {} with {} live particles", count, s.count());
            return;
        }
        s.max_count = count;
    }

    fn damping(&self, system: NativeAddr) -> f32 {
        self.system(system).map_or(0.0, |s| s.damping)
    }

    fn set_damping(&mut self, system: NativeAddr, damping: f32) {
        if let Some(s) = self.system_mut(system) {
            s.damping = damping;
        }
    }

    fn paused(&self, system: NativeAddr) -> bool {
        self.system(system).is_some_and(|s| s.paused)
    }

    fn set_paused(&mut self, system: NativeAddr, paused: bool) {
        if let Some(s) = self.system_mut(system) {
            s.paused = paused;
        }
    }

    fn particle_flags(&self, system: NativeAddr, index: i32) -> u32 {
        self.system(system)
            .and_then(|s| s.index(index).map(|i| s.flags[i].bits()))
            .unwrap_or(0)
    }

    fn set_particle_flags(&mut self, system: NativeAddr, index: i32, flags: u32) {
        if let Some(s) = self.system_mut(system) {
            if let Some(i) = s.index(index) {
                s.flags[i] = ParticleFlags::from_bits_retain(flags);
            }
        }
    }

    fn particle_lifetime(&self, system: NativeAddr, index: i32) -> f32 {
        self.system(system)
            .and_then(|s| s.index(index).map(|i| (s, i)))
            .and_then(|(s, i)| s.expirations[i].map(|t| (t - s.time).max(0.0)))
            .unwrap_or(0.0)
    }

    fn set_particle_lifetime(&mut self, system: NativeAddr, index: i32, lifetime: f32) {
        if let Some(s) = self.system_mut(system) {
            if let Some(i) = s.index(index) {
                s.expirations[i] = s.expiration_for(lifetime);
            }
        }
    }

    fn fill_position_buffer(&self, system: NativeAddr, out: &mut [f32]) -> usize {
        let Some(s) = self.system(system) else {
            return 0;
        };
        let written = s.count().min(out.len() / 2);
        for (pair, p) in out.chunks_exact_mut(2).zip(&s.positions).take(written) {
            pair[0] = p.x;
            pair[1] = p.y;
        }
        written
    }

    fn position_buffer_x(&self, system: NativeAddr) -> Vec<f32> {
        self.system(system)
            .map_or_else(Vec::new, |s| s.positions.iter().map(|p| p.x).collect())
    }

    fn position_buffer_y(&self, system: NativeAddr) -> Vec<f32> {
        self.system(system)
            .map_or_else(Vec::new, |s| s.positions.iter().map(|p| p.y).collect())
    }

    fn fill_velocity_buffer(&self, system: NativeAddr, out: &mut Vec<Vector2>) {
        out.clear();
        if let Some(s) = self.system(system) {
            out.extend_from_slice(&s.velocities);
        }
    }

    fn velocity_buffer_x(&self, system: NativeAddr) -> Vec<f32> {
        self.system(system)
            .map_or_else(Vec::new, |s| s.velocities.iter().map(|v| v.x).collect())
    }

    fn velocity_buffer_y(&self, system: NativeAddr) -> Vec<f32> {
        self.system(system)
            .map_or_else(Vec::new, |s| s.velocities.iter().map(|v| v.y).collect())
    }

    fn fill_color_buffer(&self, system: NativeAddr, out: &mut Vec<ParticleColor>) {
        out.clear();
        if let Some(s) = self.system(system) {
            out.extend_from_slice(&s.colors);
        }
    }

    fn color_buffer_channel(&self, system: NativeAddr, channel: ColorChannel) -> Vec<i32> {
        self.system(system).map_or_else(Vec::new, |s| {
            s.colors.iter().map(|c| c.channel(channel) as i32).collect()
        })
    }

    fn step(&mut self, system: NativeAddr, time_step: f32, gravity: Vector2) -> StepReport {
        let Some(sys) = self.system_mut(system) else {
            return StepReport::default();
        };
        let report = sys.step(time_step, gravity);
        trace!(
            "stepped system {:#x}: {} particles, {} reported removals, {} groups destroyed",
            system.0,
            sys.count(),
            report.destroyed_particles.len(),
            report.destroyed_groups.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{CircleShape, PolygonShape};

    fn particle_at(x: f32, group: NativeAddr) -> RawParticleDef {
        RawParticleDef {
            flags: 0,
            position: Vector2::new(x, 0.0),
            velocity: Vector2::zero(),
            color: ParticleColor::default(),
            lifetime: 0.0,
            group,
        }
    }

    fn group_def<'a>(
        shape: Option<&'a dyn Shape>,
        points: Option<&'a [Vector2]>,
    ) -> RawGroupDef<'a> {
        RawGroupDef {
            flags: 0,
            group_flags: 0,
            position: Vector2::zero(),
            angle: 0.0,
            linear_velocity: Vector2::zero(),
            angular_velocity: 0.0,
            color: ParticleColor::default(),
            strength: 1.0,
            shape,
            stride: 0.0,
            particle_count: 0,
            position_data: points,
            lifetime: 0.0,
            group: NativeAddr::NULL,
        }
    }

    #[test]
    fn removal_waits_for_step_and_compacts() {
        let mut engine = SoftwareEngine::new();
        let sys = engine.create_system(&ParticleSystemDef::default());
        for x in 0..4 {
            engine.create_particle(sys, &particle_at(x as f32, NativeAddr::NULL));
        }

        engine.destroy_particle(sys, 1, false);
        assert_eq!(engine.particle_count(sys), 4);

        engine.step(sys, 0.0, Vector2::zero());
        assert_eq!(engine.position_buffer_x(sys), vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn oldest_rank_ignores_buffer_order() {
        let mut engine = SoftwareEngine::new();
        let sys = engine.create_system(&ParticleSystemDef::default());
        let points = [Vector2::new(10.0, 0.0)];
        let group = engine.create_group(sys, &group_def(None, Some(&points)));

        // The second grouped particle is rotated in front of the ungrouped one
        engine.create_particle(sys, &particle_at(1.0, NativeAddr::NULL));
        let index = engine.create_particle(sys, &particle_at(2.0, group));
        assert_eq!(index, 1);

        engine.destroy_oldest_particle(sys, 0, false);
        engine.step(sys, 0.0, Vector2::zero());
        // The group particle at 10.0 was created first
        assert_eq!(engine.position_buffer_x(sys), vec![2.0, 1.0]);
    }

    #[test]
    fn procedural_fill_covers_box_on_stride_grid() {
        let mut engine = SoftwareEngine::new();
        let sys = engine.create_system(&ParticleSystemDef::default());
        let shape = PolygonShape::new_box(1.0, 1.0);
        let mut def = group_def(Some(&shape), None);
        def.stride = 0.5;

        let group = engine.create_group(sys, &def);
        // Rows and columns at -1.0, -0.5, 0.0, 0.5
        assert_eq!(engine.group_particle_count(sys, group), 16);
    }

    #[test]
    fn capacity_rejects_whole_group() {
        let mut engine = SoftwareEngine::new();
        let sys = engine.create_system(&ParticleSystemDef { max_count: 3, ..Default::default() });
        let shape = CircleShape::new(2.0);
        let mut def = group_def(Some(&shape), None);
        def.stride = 0.5;

        assert!(engine.create_group(sys, &def).is_null());
        assert_eq!(engine.particle_count(sys), 0);
    }

    #[test]
    fn lifetimes_expire_by_age() {
        let mut engine = SoftwareEngine::new();
        let def = ParticleSystemDef { lifetime_granularity: 0.5, ..Default::default() };
        let sys = engine.create_system(&def);
        let mut particle = particle_at(0.0, NativeAddr::NULL);
        particle.lifetime = 0.7;
        engine.create_particle(sys, &particle);

        // 0.7 rounds up to 1.0
        assert_eq!(engine.particle_lifetime(sys, 0), 1.0);
        engine.step(sys, 0.75, Vector2::zero());
        assert_eq!(engine.particle_count(sys), 1);
        engine.step(sys, 0.25, Vector2::zero());
        assert_eq!(engine.particle_count(sys), 0);
    }

    #[test]
    fn paused_system_keeps_pending_removals() {
        let mut engine = SoftwareEngine::new();
        let sys = engine.create_system(&ParticleSystemDef::default());
        engine.create_particle(sys, &particle_at(0.0, NativeAddr::NULL));
        engine.destroy_particle(sys, 0, true);
        engine.set_paused(sys, true);

        let report = engine.step(sys, 1.0 / 60.0, Vector2::new(0.0, -10.0));
        assert!(report.destroyed_particles.is_empty());
        assert_eq!(engine.particle_count(sys), 1);

        engine.set_paused(sys, false);
        let report = engine.step(sys, 1.0 / 60.0, Vector2::new(0.0, -10.0));
        assert_eq!(report.destroyed_particles.len(), 1);
        assert_eq!(report.destroyed_particles[0].index, 0);
    }

    #[test]
    fn max_count_below_live_count_is_rejected() {
        let mut engine = SoftwareEngine::new();
        let sys = engine.create_system(&ParticleSystemDef::default());
        for x in 0..3 {
            engine.create_particle(sys, &particle_at(x as f32, NativeAddr::NULL));
        }
        engine.set_max_particle_count(sys, 2);
        assert_eq!(engine.max_particle_count(sys), 0);
        engine.set_max_particle_count(sys, 5);
        assert_eq!(engine.max_particle_count(sys), 5);
    }
}
