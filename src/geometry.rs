use anyhow::{ensure, Context};
use arrayvec::ArrayVec;
use na::{Point3, Vector3};

pub type Fp = f64;
pub type Vec3f = Vector3<Fp>;
pub type Point3f = Point3<Fp>;

/// Hits at `t <= EPS` are rejected so that rays leaving a surface do not
/// immediately hit it again.
pub const EPS: Fp = 0.00001;

/// A half-line with a unit direction.
#[derive(Clone, Debug)]
pub struct Ray {
    origin: Point3f,
    direction: Vec3f,
}

impl Ray {
    /// Returns `None` when `direction` has zero length.
    pub fn new(origin: Point3f, direction: Vec3f) -> Option<Ray> {
        direction
            .try_normalize(Fp::EPSILON)
            .map(|direction| Ray { origin, direction })
    }

    /// Ray from `origin` through `target`; `None` if both points coincide.
    pub fn towards(origin: Point3f, target: &Point3f) -> Option<Ray> {
        Ray::new(origin, *target - origin)
    }

    pub fn origin(&self) -> &Point3f {
        &self.origin
    }

    pub fn direction(&self) -> &Vec3f {
        &self.direction
    }

    pub fn at(&self, t: Fp) -> Point3f {
        self.origin + self.direction * t
    }

    pub fn hit_point(&self, intersection: &Intersection) -> Point3f {
        self.at(intersection.offset)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Intersection {
    pub offset: Fp,
    /// Unit normal, always facing against the incoming ray.
    pub normal: Vec3f,
    /// False when the ray travels inside the shape (or hits a plane from its back side).
    pub is_outer_to_inner: bool,
}

#[derive(Clone, Debug)]
pub enum Shape3D {
    Sphere { center: Point3f, radius: Fp },
    Box { min: Point3f, max: Point3f },
    Plane { norm: Vec3f, point: Point3f },
}

impl Shape3D {
    pub fn sphere(center: Point3f, radius: Fp) -> anyhow::Result<Shape3D> {
        ensure!(
            radius > 0.0 && radius.is_finite(),
            "sphere radius must be positive, got {radius}"
        );
        Ok(Shape3D::Sphere { center, radius })
    }

    /// The corners may be given in any order; they are sorted per axis.
    pub fn axis_aligned_box(a: Point3f, b: Point3f) -> Shape3D {
        Shape3D::Box {
            min: Point3f::from(a.coords.inf(&b.coords)),
            max: Point3f::from(a.coords.sup(&b.coords)),
        }
    }

    pub fn plane(norm: Vec3f, point: Point3f) -> anyhow::Result<Shape3D> {
        let norm = norm
            .try_normalize(Fp::EPSILON)
            .context("plane normal must be non-zero")?;
        Ok(Shape3D::Plane { norm, point })
    }

    /// Nearest intersection with `t > EPS`, if any.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        match self {
            Shape3D::Sphere { center, radius } => intersect_sphere(ray, center, *radius),
            Shape3D::Box { min, max } => intersect_box(ray, min, max),
            Shape3D::Plane { norm, point } => intersect_plane(ray, norm, point),
        }
    }
}

fn intersect_sphere(ray: &Ray, center: &Point3f, radius: Fp) -> Option<Intersection> {
    let oc = ray.origin - *center;
    let b = ray.direction.dot(&oc);
    let discr = b * b - (oc.norm_squared() - radius * radius);
    // also rejects NaN
    if !(discr >= 0.0) {
        return None;
    }
    let root = discr.sqrt();
    let t_near = -b - root;
    let t_far = -b + root;
    if t_near > EPS {
        Some(Intersection {
            offset: t_near,
            normal: (ray.at(t_near) - *center).normalize(),
            is_outer_to_inner: true,
        })
    } else if t_far > EPS {
        Some(Intersection {
            offset: t_far,
            normal: -(ray.at(t_far) - *center).normalize(),
            is_outer_to_inner: false,
        })
    } else {
        None
    }
}

fn intersect_box(ray: &Ray, min: &Point3f, max: &Point3f) -> Option<Intersection> {
    let mut candidates = ArrayVec::<Intersection, 6>::new();
    for axis in 0..3 {
        let d = ray.direction[axis];
        if d.abs() <= Fp::EPSILON {
            continue;
        }
        for (bound, sign) in [(min[axis], -1.0), (max[axis], 1.0)] {
            let offset = (bound - ray.origin[axis]) / d;
            if offset <= EPS {
                continue;
            }
            let p = ray.at(offset);
            let on_face = (0..3)
                .filter(|&other| other != axis)
                .all(|other| min[other] <= p[other] && p[other] <= max[other]);
            if !on_face {
                continue;
            }
            let mut outward = Vec3f::zeros();
            outward[axis] = sign;
            let is_outer_to_inner = outward.dot(&ray.direction) < 0.0;
            candidates.push(Intersection {
                offset,
                normal: if is_outer_to_inner { outward } else { -outward },
                is_outer_to_inner,
            });
        }
    }
    candidates
        .into_iter()
        .min_by(|a, b| a.offset.total_cmp(&b.offset))
}

fn intersect_plane(ray: &Ray, norm: &Vec3f, point: &Point3f) -> Option<Intersection> {
    let x = norm.dot(&ray.direction);
    if x.abs() < EPS {
        return None;
    }
    let offset = (*point - ray.origin).dot(norm) / x;
    if offset <= EPS {
        return None;
    }
    Some(Intersection {
        offset,
        normal: if x < 0.0 { *norm } else { -norm },
        is_outer_to_inner: x < 0.0,
    })
}

pub fn get_reflection_ray(ray: &Vec3f, normal: &Vec3f) -> Vec3f {
    let projection = -ray.dot(normal);
    ray + normal * projection * 2.0
}

/// Snell's law for a unit `direction` and a unit `normal` facing against it.
/// `n1` is the index on the incoming side. Returns `None` on total internal reflection.
pub fn get_refraction_ray(direction: &Vec3f, normal: &Vec3f, n1: Fp, n2: Fp) -> Option<Vec3f> {
    let eta = n1 / n2;
    let cos_in = -direction.dot(normal);
    let sin2_out = eta * eta * (1.0 - cos_in * cos_in);
    if !(sin2_out <= 1.0) {
        return None;
    }
    let cos_out = (1.0 - sin2_out).sqrt();
    Some(direction * eta + normal * (eta * cos_in - cos_out))
}
