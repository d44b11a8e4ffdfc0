use anyhow::{ensure, Context};

use crate::geometry::{Fp, Point3f, Ray, Vec3f};

/// Pinhole camera with a planar image surface at `distance_to_plane` in front of it.
///
/// Pixel `x` grows to the right and pixel `y` grows downward; the world-space
/// offsets on the view plane follow `right` and `up`.
#[derive(Clone, Debug)]
pub struct PinholeCamera {
    position: Point3f,
    towards: Vec3f,
    up: Vec3f,
    right: Vec3f,
    distance_to_plane: Fp,
    center: Point3f,
    resolution_x: u32,
    resolution_y: u32,
    view_plane_width: Fp,
}

impl PinholeCamera {
    pub fn new(
        position: Point3f,
        towards: Vec3f,
        up: Vec3f,
        distance_to_plane: Fp,
    ) -> anyhow::Result<PinholeCamera> {
        ensure!(
            distance_to_plane > 0.0 && distance_to_plane.is_finite(),
            "distance to the view plane must be positive, got {distance_to_plane}"
        );
        let towards = towards
            .try_normalize(Fp::EPSILON)
            .context("camera towards vector must be non-zero")?;
        let up = up
            .try_normalize(Fp::EPSILON)
            .context("camera up vector must be non-zero")?;
        let right = up
            .cross(&towards)
            .try_normalize(Fp::EPSILON)
            .context("camera up and towards vectors must not be parallel")?;
        Ok(PinholeCamera {
            position,
            towards,
            up,
            right,
            distance_to_plane,
            center: position + towards * distance_to_plane,
            resolution_x: 200,
            resolution_y: 200,
            view_plane_width: 2.0,
        })
    }

    pub fn init_resolution(&mut self, height: u32, width: u32, view_plane_width: Fp) {
        self.resolution_y = height;
        self.resolution_x = width;
        self.view_plane_width = view_plane_width;
    }

    pub fn with_resolution(&self, height: u32, width: u32, view_plane_width: Fp) -> PinholeCamera {
        let mut camera = self.clone();
        camera.init_resolution(height, width, view_plane_width);
        camera
    }

    /// World-space center of pixel `(x, y)` on the view plane.
    pub fn transform(&self, x: u32, y: u32) -> Point3f {
        self.transform_subpixel(x as Fp, y as Fp)
    }

    /// Same mapping as [`PinholeCamera::transform`] for fractional pixel coordinates.
    pub fn transform_subpixel(&self, x: Fp, y: Fp) -> Point3f {
        let half_x = (self.resolution_x / 2) as Fp;
        let half_y = (self.resolution_y / 2) as Fp;
        let right_distance = (half_x - x) * (self.view_plane_width / self.resolution_x as Fp);
        let up_distance = (half_y - y) * (self.view_plane_width / self.resolution_y as Fp);
        self.center + self.right * right_distance + self.up * up_distance
    }

    pub fn position(&self) -> Point3f {
        self.position
    }

    pub fn towards(&self) -> &Vec3f {
        &self.towards
    }

    pub fn up(&self) -> &Vec3f {
        &self.up
    }

    pub fn right(&self) -> &Vec3f {
        &self.right
    }

    pub fn distance_to_plane(&self) -> Fp {
        self.distance_to_plane
    }

    pub fn ray_through(&self, x: u32, y: u32) -> Option<Ray> {
        Ray::towards(self.position, &self.transform(x, y))
    }

    pub fn ray_through_subpixel(&self, x: Fp, y: Fp) -> Option<Ray> {
        Ray::towards(self.position, &self.transform_subpixel(x, y))
    }
}
