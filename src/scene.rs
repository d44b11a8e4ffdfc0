use anyhow::ensure;

use crate::camera::PinholeCamera;
use crate::geometry::Vec3f;
use crate::lights::LightSource;
use crate::surface::Surface;

/// How often the reflected and refracted contributions are added at a hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecondaryRays {
    /// Once for every light that is not occluded at the hit point.
    #[default]
    PerUnoccludedLight,
    /// Once per hit, whatever the lights see.
    PerHit,
}

/// Mutable scene description. Every setter returns the builder so calls chain;
/// singular fields keep the last value, lights and surfaces accumulate.
#[derive(Clone, Debug)]
pub struct SceneBuilder {
    name: String,
    camera: Option<PinholeCamera>,
    ambient_light: Vec3f,
    bg_color: Vec3f,
    lights: Vec<LightSource>,
    surfaces: Vec<Surface>,
    max_recursion_level: usize,
    anti_aliasing_factor: u32,
    render_reflections: bool,
    render_refractions: bool,
    secondary_rays: SecondaryRays,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        SceneBuilder {
            name: "scene".to_string(),
            camera: None,
            ambient_light: Vec3f::new(1.0, 1.0, 1.0),
            bg_color: Vec3f::new(0.0, 0.5, 1.0),
            lights: vec![],
            surfaces: vec![],
            max_recursion_level: 1,
            anti_aliasing_factor: 1,
            render_reflections: false,
            render_refractions: false,
            secondary_rays: SecondaryRays::default(),
        }
    }
}

impl SceneBuilder {
    pub fn new() -> SceneBuilder {
        SceneBuilder::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_camera(mut self, camera: PinholeCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_ambient(mut self, ambient_light: Vec3f) -> Self {
        self.ambient_light = ambient_light;
        self
    }

    pub fn with_background(mut self, bg_color: Vec3f) -> Self {
        self.bg_color = bg_color;
        self
    }

    pub fn add_light(mut self, light: LightSource) -> Self {
        self.lights.push(light);
        self
    }

    pub fn add_surface(mut self, surface: Surface) -> Self {
        self.surfaces.push(surface);
        self
    }

    pub fn with_max_recursion_level(mut self, max_recursion_level: usize) -> Self {
        self.max_recursion_level = max_recursion_level;
        self
    }

    pub fn with_anti_aliasing_factor(mut self, anti_aliasing_factor: u32) -> Self {
        self.anti_aliasing_factor = anti_aliasing_factor;
        self
    }

    pub fn with_reflections(mut self, render_reflections: bool) -> Self {
        self.render_reflections = render_reflections;
        self
    }

    pub fn with_refractions(mut self, render_refractions: bool) -> Self {
        self.render_refractions = render_refractions;
        self
    }

    pub fn with_secondary_rays(mut self, secondary_rays: SecondaryRays) -> Self {
        self.secondary_rays = secondary_rays;
        self
    }

    /// Freezes the description. A missing camera is reported by [`Scene::render`].
    pub fn build(self) -> anyhow::Result<Scene> {
        ensure!(
            (1..=3).contains(&self.anti_aliasing_factor),
            "anti-aliasing factor must be 1, 2 or 3, got {}",
            self.anti_aliasing_factor
        );
        Ok(Scene {
            name: self.name,
            camera: self.camera,
            ambient_light: self.ambient_light,
            bg_color: self.bg_color,
            lights: self.lights,
            surfaces: self.surfaces,
            max_recursion_level: self.max_recursion_level,
            anti_aliasing_factor: self.anti_aliasing_factor,
            render_reflections: self.render_reflections,
            render_refractions: self.render_refractions,
            secondary_rays: self.secondary_rays,
        })
    }
}

/// Render-ready scene. Rendering only borrows it, so it can be rendered
/// repeatedly and from several threads.
#[derive(Debug)]
pub struct Scene {
    pub(crate) name: String,
    pub(crate) camera: Option<PinholeCamera>,
    pub(crate) ambient_light: Vec3f,
    pub(crate) bg_color: Vec3f,
    pub(crate) lights: Vec<LightSource>,
    pub(crate) surfaces: Vec<Surface>,
    pub(crate) max_recursion_level: usize,
    pub(crate) anti_aliasing_factor: u32,
    pub(crate) render_reflections: bool,
    pub(crate) render_refractions: bool,
    pub(crate) secondary_rays: SecondaryRays,
}

impl Scene {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn camera(&self) -> Option<&PinholeCamera> {
        self.camera.as_ref()
    }

    pub fn ambient_light(&self) -> &Vec3f {
        &self.ambient_light
    }

    pub fn bg_color(&self) -> &Vec3f {
        &self.bg_color
    }

    pub fn lights(&self) -> &[LightSource] {
        &self.lights
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn max_recursion_level(&self) -> usize {
        self.max_recursion_level
    }

    pub fn anti_aliasing_factor(&self) -> u32 {
        self.anti_aliasing_factor
    }

    pub fn render_reflections(&self) -> bool {
        self.render_reflections
    }

    pub fn render_refractions(&self) -> bool {
        self.render_refractions
    }

    pub fn secondary_rays(&self) -> SecondaryRays {
        self.secondary_rays
    }
}
