use std::cmp::Ordering;

use crate::geometry::{Fp, Intersection, Ray, Shape3D, Vec3f};

/// Reflectance and transmittance coefficients of a surface.
#[derive(Clone, Debug)]
pub struct Material {
    pub ka: Vec3f,
    pub kd: Vec3f,
    pub ks: Vec3f,
    pub shininess: Fp,
    pub reflection_intensity: Fp,
    pub refraction_intensity: Fp,
    pub refractive_index_inside: Fp,
    pub refractive_index_outside: Fp,
    pub transparent: bool,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            ka: Vec3f::new(0.1, 0.1, 0.1),
            kd: Vec3f::new(0.8, 0.8, 0.8),
            ks: Vec3f::new(0.7, 0.7, 0.7),
            shininess: 10.0,
            reflection_intensity: 0.0,
            refraction_intensity: 0.0,
            refractive_index_inside: 1.5,
            refractive_index_outside: 1.0,
            transparent: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Surface {
    pub shape: Shape3D,
    pub material: Material,
}

impl Surface {
    pub fn new(shape: Shape3D, material: Material) -> Surface {
        Surface { shape, material }
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        self.shape
            .intersect(ray)
            .map(|intersection| Hit::new(intersection, self))
    }

    pub fn is_transparent(&self) -> bool {
        self.material.transparent
    }

    /// Refractive index on the side the ray comes from.
    pub fn n1(&self, hit: &Hit<'_>) -> Fp {
        if hit.is_outer_to_inner {
            self.material.refractive_index_outside
        } else {
            self.material.refractive_index_inside
        }
    }

    /// Refractive index on the side the ray continues into.
    pub fn n2(&self, hit: &Hit<'_>) -> Fp {
        if hit.is_outer_to_inner {
            self.material.refractive_index_inside
        } else {
            self.material.refractive_index_outside
        }
    }
}

/// A ray/surface intersection. Hits compare by distance only.
#[derive(Clone, Debug)]
pub struct Hit<'a> {
    pub t: Fp,
    pub normal: Vec3f,
    pub is_outer_to_inner: bool,
    pub surface: &'a Surface,
}

impl<'a> Hit<'a> {
    fn new(intersection: Intersection, surface: &'a Surface) -> Hit<'a> {
        Hit {
            t: intersection.offset,
            normal: intersection.normal,
            is_outer_to_inner: intersection.is_outer_to_inner,
            surface,
        }
    }
}

impl PartialEq for Hit<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.t == other.t
    }
}

impl PartialOrd for Hit<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.t.partial_cmp(&other.t)
    }
}
