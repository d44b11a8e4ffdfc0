use na::{distance, distance_squared};

use crate::geometry::{Point3f, Ray, Vec3f};
use crate::surface::Surface;

#[derive(Clone, Debug)]
pub enum LightLocation {
    /// Light arriving along `direction` from a source at infinity.
    Directed { direction: Vec3f },
    /// `attenuation` holds the constant, linear and quadratic decay factors (kc, kl, kq).
    Point { position: Point3f, attenuation: Vec3f },
}

#[derive(Clone, Debug)]
pub struct LightSource {
    pub light_intensity: Vec3f,
    pub location: LightLocation,
}

impl LightSource {
    /// Point light with the default decay `kc = 1, kl = 0.1, kq = 0.01`.
    pub fn point(position: Point3f, light_intensity: Vec3f) -> LightSource {
        LightSource {
            light_intensity,
            location: LightLocation::Point {
                position,
                attenuation: Vec3f::new(1.0, 0.1, 0.01),
            },
        }
    }

    pub fn directed(direction: Vec3f, light_intensity: Vec3f) -> LightSource {
        LightSource {
            light_intensity,
            location: LightLocation::Directed { direction },
        }
    }

    /// Replaces the decay factors of a point light; directed lights are left as they are.
    pub fn with_decay(mut self, kq: f64, kl: f64, kc: f64) -> LightSource {
        if let LightLocation::Point { attenuation, .. } = &mut self.location {
            *attenuation = Vec3f::new(kc, kl, kq);
        }
        self
    }

    /// `None` when no direction toward the light can be formed from `point`.
    pub fn ray_to_light(&self, point: &Point3f) -> Option<Ray> {
        match &self.location {
            LightLocation::Directed { direction } => Ray::new(*point, -direction),
            LightLocation::Point { position, .. } => Ray::towards(*point, position),
        }
    }

    pub fn is_occluded_by(&self, surface: &Surface, ray_to_light: &Ray) -> bool {
        let Some(hit) = surface.intersect(ray_to_light) else {
            return false;
        };
        match &self.location {
            LightLocation::Directed { .. } => true,
            LightLocation::Point { position, .. } => {
                let origin = ray_to_light.origin();
                distance_squared(origin, position)
                    > distance_squared(origin, &ray_to_light.at(hit.t))
            }
        }
    }

    pub fn intensity(&self, point: &Point3f, _ray_to_light: &Ray) -> Vec3f {
        match &self.location {
            LightLocation::Directed { .. } => self.light_intensity,
            LightLocation::Point {
                position,
                attenuation,
            } => {
                let d = distance(point, position);
                let decay = attenuation.x + attenuation.y * d + attenuation.z * d * d;
                self.light_intensity / decay
            }
        }
    }
}
