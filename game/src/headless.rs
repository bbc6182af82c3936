//! Minimal deterministic rigid-body engine.
//!
//! Spheres integrate with semi-implicit Euler under gravity and linear
//! damping, and collide with static planes and axis-aligned boxes. It is
//! enough to roll a marble around the maze without a renderer attached.

use marble_maze_shared::vec3::{add, dot, length, scale, sub, vec3, Vec3};

use crate::engine::{BodyHandle, EngineEvent, PhysicsEngine, SphereDesc};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeadlessConfig {
    pub gravity: f64,
    /// Fraction of velocity lost per second
    pub linear_damping: f64,
    pub restitution: f64,
    /// Impacts slower than this do not bounce
    pub bounce_min_speed: f64,
    /// Planes let through spheres descending faster than this
    pub plane_yield_speed: f64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            linear_damping: 0.01,
            restitution: 0.3,
            bounce_min_speed: 1.0,
            plane_yield_speed: 4.0,
        }
    }
}

impl HeadlessConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err("gravity must be finite and >= 0".to_string());
        }
        if !(0.0..1.0).contains(&self.linear_damping) {
            return Err("linear_damping must be within 0..1".to_string());
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err("restitution must be within 0..=1".to_string());
        }
        if !self.plane_yield_speed.is_finite() || self.plane_yield_speed <= 0.0 {
            return Err("plane_yield_speed must be finite and > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Sphere {
    radius: f64,
    inv_mass: f64,
    position: Vec3,
    velocity: Vec3,
    force: Vec3,
    report_contacts: bool,
    subscribed: bool,
}

#[derive(Debug, Clone)]
enum Body {
    Plane { height: f64 },
    Box { min: Vec3, max: Vec3 },
    Sphere(Sphere),
}

struct Contact {
    normal: Vec3,
    depth: f64,
}

pub struct HeadlessEngine {
    config: HeadlessConfig,
    bodies: Vec<Body>,
}

impl HeadlessEngine {
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
        }
    }

    pub fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.sphere(body).map(|s| s.position)
    }

    pub fn velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.sphere(body).map(|s| s.velocity)
    }

    fn push(&mut self, body: Body) -> BodyHandle {
        self.bodies.push(body);
        BodyHandle((self.bodies.len() - 1) as u32)
    }

    fn sphere(&self, body: BodyHandle) -> Option<&Sphere> {
        match self.bodies.get(body.0 as usize) {
            Some(Body::Sphere(s)) => Some(s),
            _ => None,
        }
    }

    fn sphere_mut(&mut self, body: BodyHandle) -> Option<&mut Sphere> {
        match self.bodies.get_mut(body.0 as usize) {
            Some(Body::Sphere(s)) => Some(s),
            _ => None,
        }
    }

    fn integrate(&self, sphere: &mut Sphere, dt: f64) {
        let accel = add(
            vec3(0.0, -self.config.gravity, 0.0),
            scale(sphere.force, sphere.inv_mass),
        );
        sphere.velocity = add(sphere.velocity, scale(accel, dt));
        sphere.velocity = scale(
            sphere.velocity,
            (1.0 - self.config.linear_damping).powf(dt),
        );
        sphere.position = add(sphere.position, scale(sphere.velocity, dt));
        sphere.force = Vec3::ZERO;
    }

    fn contact(&self, sphere: &Sphere, body: &Body) -> Option<Contact> {
        match *body {
            Body::Plane { height } => {
                // Centre already below the surface: the sphere went through
                if sphere.position.y < height {
                    return None;
                }
                if sphere.velocity.y < -self.config.plane_yield_speed {
                    return None;
                }
                let depth = height + sphere.radius - sphere.position.y;
                (depth > 0.0).then_some(Contact {
                    normal: vec3(0.0, 1.0, 0.0),
                    depth,
                })
            }
            Body::Box { min, max } => box_contact(sphere, min, max),
            Body::Sphere(_) => None,
        }
    }

    fn resolve(&self, sphere: &mut Sphere, contact: &Contact) {
        sphere.position = add(sphere.position, scale(contact.normal, contact.depth));
        let vn = dot(sphere.velocity, contact.normal);
        if vn < 0.0 {
            let bounce = if -vn > self.config.bounce_min_speed {
                self.config.restitution
            } else {
                0.0
            };
            sphere.velocity = sub(sphere.velocity, scale(contact.normal, vn * (1.0 + bounce)));
        }
    }
}

fn box_contact(sphere: &Sphere, min: Vec3, max: Vec3) -> Option<Contact> {
    let p = sphere.position;
    let closest = vec3(
        p.x.clamp(min.x, max.x),
        p.y.clamp(min.y, max.y),
        p.z.clamp(min.z, max.z),
    );
    let d = sub(p, closest);
    let dist = length(d);

    if dist > 1e-9 {
        if dist >= sphere.radius {
            return None;
        }
        return Some(Contact {
            normal: scale(d, 1.0 / dist),
            depth: sphere.radius - dist,
        });
    }

    // Centre inside the box: leave through the nearest face
    let faces = [
        (p.x - min.x, vec3(-1.0, 0.0, 0.0)),
        (max.x - p.x, vec3(1.0, 0.0, 0.0)),
        (p.y - min.y, vec3(0.0, -1.0, 0.0)),
        (max.y - p.y, vec3(0.0, 1.0, 0.0)),
        (p.z - min.z, vec3(0.0, 0.0, -1.0)),
        (max.z - p.z, vec3(0.0, 0.0, 1.0)),
    ];
    let (gap, normal) = faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))?;
    Some(Contact {
        normal,
        depth: gap + sphere.radius,
    })
}

impl PhysicsEngine for HeadlessEngine {
    fn add_plane(&mut self, height: f64) -> BodyHandle {
        self.push(Body::Plane { height })
    }

    fn add_box(&mut self, center: Vec3, half_extents: Vec3) -> BodyHandle {
        self.push(Body::Box {
            min: sub(center, half_extents),
            max: add(center, half_extents),
        })
    }

    fn add_sphere(&mut self, desc: SphereDesc) -> BodyHandle {
        let inv_mass = if desc.mass > 0.0 { 1.0 / desc.mass } else { 0.0 };
        self.push(Body::Sphere(Sphere {
            radius: desc.radius,
            inv_mass,
            position: desc.position,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            report_contacts: desc.report_contacts,
            subscribed: false,
        }))
    }

    fn subscribe_position(&mut self, body: BodyHandle) {
        if let Some(s) = self.sphere_mut(body) {
            s.subscribed = true;
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec3, _point: Vec3) {
        // Point forces would add torque; spheres here carry no rotation.
        if let Some(s) = self.sphere_mut(body) {
            s.force = add(s.force, force);
        }
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(s) = self.sphere_mut(body) {
            s.position = position;
        }
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(s) = self.sphere_mut(body) {
            s.velocity = velocity;
        }
    }

    fn step(&mut self, dt: f64, events: &mut Vec<EngineEvent>) {
        for idx in 0..self.bodies.len() {
            let Body::Sphere(mut sphere) = self.bodies[idx].clone() else {
                continue;
            };
            let handle = BodyHandle(idx as u32);

            self.integrate(&mut sphere, dt);

            for (other_idx, other) in self.bodies.iter().enumerate() {
                if other_idx == idx {
                    continue;
                }
                if let Some(contact) = self.contact(&sphere, other) {
                    self.resolve(&mut sphere, &contact);
                    if sphere.report_contacts {
                        events.push(EngineEvent::Contact {
                            body: handle,
                            normal: contact.normal,
                        });
                    }
                }
            }

            if sphere.subscribed {
                events.push(EngineEvent::Position {
                    body: handle,
                    position: sphere.position,
                });
            }
            self.bodies[idx] = Body::Sphere(sphere);
        }
    }
}
