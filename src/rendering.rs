use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use anyhow::{anyhow, ensure, Context};
use image::RgbImage;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;

use crate::camera::PinholeCamera;
use crate::geometry::{get_reflection_ray, get_refraction_ray, Fp, Point3f, Ray, Vec3f};
use crate::lights::LightSource;
use crate::scene::{Scene, SecondaryRays};
use crate::surface::Hit;

/// Receives the human-readable progress lines of a render.
pub trait LogSink: Sync {
    fn log(&self, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Sync,
{
    fn log(&self, line: &str) {
        self(line)
    }
}

/// Forwards render progress to the `log` facade at info level.
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn log(&self, line: &str) {
        log::info!("{line}");
    }
}

impl Scene {
    pub fn render(
        &self,
        width: u32,
        height: u32,
        view_plane_width: Fp,
        sink: &dyn LogSink,
    ) -> anyhow::Result<RgbImage> {
        self.render_with_progress(width, height, view_plane_width, sink, ProgressBar::hidden())
    }

    /// Renders on a dedicated pool of `max(2, available cores)` threads, ticking
    /// `progress` once per pixel. A panic in any worker fails the whole render.
    pub fn render_with_progress(
        &self,
        width: u32,
        height: u32,
        view_plane_width: Fp,
        sink: &dyn LogSink,
        progress: ProgressBar,
    ) -> anyhow::Result<RgbImage> {
        ensure!(
            width > 0 && height > 0,
            "image dimensions must be positive, got {width}x{height}"
        );
        ensure!(
            view_plane_width > 0.0 && view_plane_width.is_finite(),
            "view plane width must be positive, got {view_plane_width}"
        );
        let camera = self
            .camera
            .as_ref()
            .with_context(|| format!("camera of scene '{}' was not initialized", self.name))?
            .with_resolution(height, width, view_plane_width);

        let threads = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            .max(2);
        sink.log(&format!(
            "Initialize thread pool. Using {threads} threads to render {}",
            self.name
        ));

        let factor = self.anti_aliasing_factor as u64;
        sink.log(&format!(
            "Starting to shoot {} rays over {}",
            width as u64 * height as u64 * factor * factor,
            self.name
        ));
        let start = Instant::now();

        let mut image = RgbImage::new(width, height);
        progress.set_length(width as u64 * height as u64);
        shade_pixels(&mut image, threads, "render-worker", &progress, |x, y| {
            radiance_to_rgb(&self.pixel_radiance(&camera, x, y))
        })
        .with_context(|| format!("rendering {} failed", self.name))?;
        progress.finish();

        sink.log("Done shooting rays.");
        log::debug!("{} rendered in {:.2?}", self.name, start.elapsed());
        sink.log(&format!("Ray tracing of {} has been completed.", self.name));
        Ok(image)
    }

    /// Radiance seen along `ray`, as computed for a primary camera ray.
    pub fn trace(&self, ray: &Ray) -> Vec3f {
        self.shade(ray, 0)
    }

    /// Closest hit over all surfaces; on equal distances the earlier surface wins.
    pub fn find_min_hit(&self, ray: &Ray) -> Option<Hit<'_>> {
        let mut min_hit: Option<Hit<'_>> = None;
        for surface in &self.surfaces {
            if let Some(hit) = surface.intersect(ray) {
                if min_hit.as_ref().map_or(true, |current| hit < *current) {
                    min_hit = Some(hit);
                }
            }
        }
        min_hit
    }

    fn is_occluded(&self, light: &LightSource, ray_to_light: &Ray) -> bool {
        self.surfaces
            .iter()
            .any(|surface| light.is_occluded_by(surface, ray_to_light))
    }

    /// Average over the `f x f` sub-pixel centers, `f` being the anti-aliasing factor.
    fn pixel_radiance(&self, camera: &PinholeCamera, x: u32, y: u32) -> Vec3f {
        let factor = self.anti_aliasing_factor.max(1);
        let step = 1.0 / factor as Fp;
        let mut sum = Vec3f::zeros();
        for i in 0..factor {
            for j in 0..factor {
                let sub_x = x as Fp + (i as Fp + 0.5) * step - 0.5;
                let sub_y = y as Fp + (j as Fp + 0.5) * step - 0.5;
                // unreachable for a validated camera; a missing ray counts as black
                if let Some(ray) = camera.ray_through_subpixel(sub_x, sub_y) {
                    sum += self.shade(&ray, 0);
                }
            }
        }
        sum / (factor * factor) as Fp
    }

    fn shade(&self, ray: &Ray, depth: usize) -> Vec3f {
        if depth >= self.max_recursion_level {
            return Vec3f::zeros();
        }
        let Some(hit) = self.find_min_hit(ray) else {
            return self.bg_color;
        };
        let point = ray.at(hit.t);
        let material = &hit.surface.material;
        let mut color = material.ka.component_mul(&self.ambient_light);

        let mut unoccluded_lights = 0usize;
        for light in &self.lights {
            let Some(ray_to_light) = light.ray_to_light(&point) else {
                continue;
            };
            if self.is_occluded(light, &ray_to_light) {
                continue;
            }
            let intensity = light.intensity(&point, &ray_to_light);
            let local = diffuse(&hit, &ray_to_light) + specular(&hit, &ray_to_light, ray);
            color += local.component_mul(&intensity);
            unoccluded_lights += 1;
        }

        let secondary_weight = match self.secondary_rays {
            SecondaryRays::PerUnoccludedLight => unoccluded_lights,
            SecondaryRays::PerHit => 1,
        };
        if secondary_weight > 0 {
            color += self.secondary_radiance(ray, &hit, &point, depth) * secondary_weight as Fp;
        }
        color
    }

    fn secondary_radiance(&self, ray: &Ray, hit: &Hit<'_>, point: &Point3f, depth: usize) -> Vec3f {
        let surface = hit.surface;
        let mut color = Vec3f::zeros();
        if self.render_reflections {
            let direction = get_reflection_ray(ray.direction(), &hit.normal);
            if let Some(reflected) = Ray::new(*point, direction) {
                color += self.shade(&reflected, depth + 1) * surface.material.reflection_intensity;
            }
        }
        if self.render_refractions && surface.is_transparent() {
            // total internal reflection contributes nothing
            let refracted = get_refraction_ray(
                ray.direction(),
                &hit.normal,
                surface.n1(hit),
                surface.n2(hit),
            )
            .and_then(|direction| Ray::new(*point, direction));
            if let Some(refracted) = refracted {
                color += self.shade(&refracted, depth + 1) * surface.material.refraction_intensity;
            }
        }
        color
    }
}

fn diffuse(hit: &Hit<'_>, ray_to_light: &Ray) -> Vec3f {
    let cos = hit.normal.dot(ray_to_light.direction());
    hit.surface.material.kd * Fp::max(0.0, cos)
}

fn specular(hit: &Hit<'_>, ray_to_light: &Ray, incoming: &Ray) -> Vec3f {
    let material = &hit.surface.material;
    let reflected_light = get_reflection_ray(&-ray_to_light.direction(), &hit.normal);
    let cos = reflected_light.dot(&-incoming.direction());
    if cos <= 0.0 {
        Vec3f::zeros()
    } else {
        material.ks * cos.powf(material.shininess)
    }
}

/// Fills `image` in parallel on a pool of `threads` workers named
/// `{worker_name}-{index}`. The workers are joined before this returns, also
/// when a pixel panics; the panic is reported as an error.
pub(crate) fn shade_pixels<F>(
    image: &mut RgbImage,
    threads: usize,
    worker_name: &str,
    progress: &ProgressBar,
    shade: F,
) -> anyhow::Result<()>
where
    F: Fn(u32, u32) -> [u8; 3] + Sync,
{
    let width = image.width() as usize;
    let worker_name = worker_name.to_owned();
    let mut workers = Vec::with_capacity(threads);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |index| format!("{worker_name}-{index}"))
        .spawn_handler(|thread| {
            let mut builder = std::thread::Builder::new();
            if let Some(name) = thread.name() {
                builder = builder.name(name.to_owned());
            }
            workers.push(builder.spawn(move || thread.run())?);
            Ok(())
        })
        .build()
        .context("failed to start the render thread pool")?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pool.install(|| {
            image
                .par_chunks_mut(3)
                .enumerate()
                .progress_with(progress.clone())
                .for_each(|(index, pixel)| {
                    let x = (index % width) as u32;
                    let y = (index / width) as u32;
                    pixel.copy_from_slice(&shade(x, y));
                })
        })
    }));

    drop(pool);
    for worker in workers {
        if worker.join().is_err() {
            log::warn!("a render worker exited with a panic");
        }
    }
    outcome.map_err(|payload| anyhow!("worker panicked: {}", panic_message(payload.as_ref())))
}

/// Clamps every channel to `[0, 1]` and scales it to a byte.
pub fn radiance_to_rgb(radiance: &Vec3f) -> [u8; 3] {
    let channel = |c: Fp| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(radiance.x), channel(radiance.y), channel(radiance.z)]
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
