//! Line-oriented scene description format.
//!
//! One command per line: a keyword followed by whitespace-separated arguments.
//! Blank lines and lines starting with `#` are skipped, unknown keywords are
//! logged and ignored. `NEW_LIGHT` and `NEW_PRIMITIVE` open a new light or
//! surface; the commands after them configure it.
//!
//! ```text
//! NAME two spheres
//! CAMERA_POSITION 0 0 5
//! CAMERA_TOWARDS 0 0 -1
//! CAMERA_UP 0 1 0
//! CAMERA_DISTANCE 1
//! RAY_DEPTH 3
//! REFLECTIONS true
//! NEW_LIGHT
//! LIGHT_POSITION 0 5 0
//! LIGHT_ATTENUATION 1 0 0
//! LIGHT_INTENSITY 1 1 1
//! NEW_PRIMITIVE
//! SPHERE 0 0 0 1
//! KD 0.8 0.2 0.2
//! REFLECTION 0.3
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail, ensure, Context};

use crate::camera::PinholeCamera;
use crate::geometry::{Fp, Point3f, Shape3D, Vec3f};
use crate::lights::{LightLocation, LightSource};
use crate::scene::{Scene, SceneBuilder, SecondaryRays};
use crate::surface::{Material, Surface};

pub fn load_scene(path: impl AsRef<Path>) -> anyhow::Result<Scene> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene file {}", path.display()))?;
    parse_scene(&content).with_context(|| format!("invalid scene file {}", path.display()))
}

struct CameraSettings {
    position: Point3f,
    towards: Vec3f,
    up: Vec3f,
    distance: Fp,
    seen: bool,
}

struct PrimitiveSettings {
    shape: Option<Shape3D>,
    material: Material,
    line: usize,
}

struct Tokens<'a> {
    keyword: &'a str,
    args: Vec<&'a str>,
}

impl Tokens<'_> {
    fn number<T: FromStr>(&self, index: usize) -> anyhow::Result<T>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let token = self
            .args
            .get(index)
            .with_context(|| format!("{} expects more arguments", self.keyword))?;
        token
            .parse()
            .with_context(|| format!("{}: cannot parse '{token}'", self.keyword))
    }

    fn expect_len(&self, len: usize) -> anyhow::Result<()> {
        ensure!(
            self.args.len() == len,
            "{} expects {len} arguments, got {}",
            self.keyword,
            self.args.len()
        );
        Ok(())
    }

    fn vector_at(&self, index: usize) -> anyhow::Result<Vec3f> {
        Ok(Vec3f::new(
            self.number(index)?,
            self.number(index + 1)?,
            self.number(index + 2)?,
        ))
    }

    fn vector(&self) -> anyhow::Result<Vec3f> {
        self.expect_len(3)?;
        self.vector_at(0)
    }

    fn flag(&self) -> anyhow::Result<bool> {
        self.expect_len(1)?;
        match self.args[0].to_ascii_lowercase().as_str() {
            "true" | "on" | "1" => Ok(true),
            "false" | "off" | "0" => Ok(false),
            other => bail!("{}: expected true or false, got '{other}'", self.keyword),
        }
    }
}

pub fn parse_scene(content: &str) -> anyhow::Result<Scene> {
    let mut builder = SceneBuilder::new();
    let mut camera = CameraSettings {
        position: Point3f::origin(),
        towards: Vec3f::new(0.0, 0.0, -1.0),
        up: Vec3f::new(0.0, 1.0, 0.0),
        distance: 1.0,
        seen: false,
    };
    let mut current_light: Option<LightSource> = None;
    let mut current_primitive: Option<PrimitiveSettings> = None;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut split = line.split_whitespace();
        let Some(keyword) = split.next() else {
            continue;
        };
        let tokens = Tokens {
            keyword,
            args: split.collect(),
        };
        builder = apply_command(
            builder,
            &tokens,
            &mut camera,
            &mut current_light,
            &mut current_primitive,
            line_number,
        )
        .with_context(|| format!("line {line_number}: {line}"))?;
    }

    if let Some(light) = current_light.take() {
        builder = builder.add_light(light);
    }
    if let Some(primitive) = current_primitive.take() {
        builder = builder.add_surface(finish_primitive(primitive)?);
    }
    if camera.seen {
        builder = builder.with_camera(PinholeCamera::new(
            camera.position,
            camera.towards,
            camera.up,
            camera.distance,
        )?);
    }
    builder.build()
}

fn apply_command(
    mut builder: SceneBuilder,
    tokens: &Tokens<'_>,
    camera: &mut CameraSettings,
    current_light: &mut Option<LightSource>,
    current_primitive: &mut Option<PrimitiveSettings>,
    line_number: usize,
) -> anyhow::Result<SceneBuilder> {
    match tokens.keyword {
        "NAME" => {
            ensure!(!tokens.args.is_empty(), "NAME expects a name");
            builder = builder.with_name(tokens.args.join(" "));
        }
        "CAMERA_POSITION" => {
            camera.position = Point3f::from(tokens.vector()?);
            camera.seen = true;
        }
        "CAMERA_TOWARDS" => {
            camera.towards = tokens.vector()?;
            camera.seen = true;
        }
        "CAMERA_UP" => {
            camera.up = tokens.vector()?;
            camera.seen = true;
        }
        "CAMERA_DISTANCE" => {
            tokens.expect_len(1)?;
            camera.distance = tokens.number(0)?;
            camera.seen = true;
        }
        "AMBIENT_LIGHT" => builder = builder.with_ambient(tokens.vector()?),
        "BG_COLOR" => builder = builder.with_background(tokens.vector()?),
        "RAY_DEPTH" => {
            tokens.expect_len(1)?;
            builder = builder.with_max_recursion_level(tokens.number(0)?);
        }
        "ANTI_ALIASING" => {
            tokens.expect_len(1)?;
            builder = builder.with_anti_aliasing_factor(tokens.number(0)?);
        }
        "REFLECTIONS" => builder = builder.with_reflections(tokens.flag()?),
        "REFRACTIONS" => builder = builder.with_refractions(tokens.flag()?),
        "SECONDARY_RAYS" => {
            tokens.expect_len(1)?;
            let policy = match tokens.args[0].to_ascii_lowercase().as_str() {
                "per_light" => SecondaryRays::PerUnoccludedLight,
                "per_hit" => SecondaryRays::PerHit,
                other => bail!("SECONDARY_RAYS: expected per_light or per_hit, got '{other}'"),
            };
            builder = builder.with_secondary_rays(policy);
        }
        "NEW_LIGHT" => {
            if let Some(finished) = current_light.take() {
                builder = builder.add_light(finished);
            }
            *current_light = Some(LightSource::point(Point3f::origin(), Vec3f::new(1.0, 1.0, 1.0)));
        }
        "LIGHT_DIRECTION" => {
            let direction = tokens.vector()?;
            light(current_light, tokens)?.location = LightLocation::Directed { direction };
        }
        "LIGHT_POSITION" => {
            let position = Point3f::from(tokens.vector()?);
            let light = light(current_light, tokens)?;
            light.location = match &light.location {
                LightLocation::Point { attenuation, .. } => LightLocation::Point {
                    position,
                    attenuation: *attenuation,
                },
                LightLocation::Directed { .. } => LightLocation::Point {
                    position,
                    attenuation: Vec3f::new(1.0, 0.1, 0.01),
                },
            };
        }
        "LIGHT_ATTENUATION" => {
            let attenuation = tokens.vector()?;
            match &mut light(current_light, tokens)?.location {
                LightLocation::Point {
                    attenuation: current,
                    ..
                } => *current = attenuation,
                LightLocation::Directed { .. } => {
                    bail!("LIGHT_ATTENUATION only applies to point lights")
                }
            }
        }
        "LIGHT_INTENSITY" => light(current_light, tokens)?.light_intensity = tokens.vector()?,
        "NEW_PRIMITIVE" => {
            if let Some(finished) = current_primitive.take() {
                builder = builder.add_surface(finish_primitive(finished)?);
            }
            *current_primitive = Some(PrimitiveSettings {
                shape: None,
                material: Material::default(),
                line: line_number,
            });
        }
        "SPHERE" | "BOX" | "PLANE" => {
            let shape = match tokens.keyword {
                "SPHERE" => {
                    tokens.expect_len(4)?;
                    Shape3D::sphere(Point3f::from(tokens.vector_at(0)?), tokens.number(3)?)?
                }
                "BOX" => {
                    tokens.expect_len(6)?;
                    Shape3D::axis_aligned_box(
                        Point3f::from(tokens.vector_at(0)?),
                        Point3f::from(tokens.vector_at(3)?),
                    )
                }
                _ => {
                    tokens.expect_len(6)?;
                    Shape3D::plane(tokens.vector_at(0)?, Point3f::from(tokens.vector_at(3)?))?
                }
            };
            current_primitive
                .as_mut()
                .ok_or_else(|| anyhow!("{} before NEW_PRIMITIVE", tokens.keyword))?
                .shape = Some(shape);
        }
        "KA" => material(current_primitive, tokens)?.ka = tokens.vector()?,
        "KD" => material(current_primitive, tokens)?.kd = tokens.vector()?,
        "KS" => material(current_primitive, tokens)?.ks = tokens.vector()?,
        "SHININESS" => {
            tokens.expect_len(1)?;
            material(current_primitive, tokens)?.shininess = tokens.number(0)?;
        }
        "REFLECTION" => {
            tokens.expect_len(1)?;
            material(current_primitive, tokens)?.reflection_intensity = tokens.number(0)?;
        }
        "REFRACTION" => {
            tokens.expect_len(1)?;
            material(current_primitive, tokens)?.refraction_intensity = tokens.number(0)?;
        }
        "IOR" => {
            tokens.expect_len(2)?;
            let material = material(current_primitive, tokens)?;
            material.refractive_index_inside = tokens.number(0)?;
            material.refractive_index_outside = tokens.number(1)?;
        }
        "TRANSPARENT" => {
            material(current_primitive, tokens)?.transparent = if tokens.args.is_empty() {
                true
            } else {
                tokens.flag()?
            };
        }
        unknown => log::warn!("line {line_number}: ignoring unknown command {unknown}"),
    }
    Ok(builder)
}

fn light<'a>(
    current: &'a mut Option<LightSource>,
    tokens: &Tokens<'_>,
) -> anyhow::Result<&'a mut LightSource> {
    current
        .as_mut()
        .ok_or_else(|| anyhow!("{} before NEW_LIGHT", tokens.keyword))
}

fn material<'a>(
    current: &'a mut Option<PrimitiveSettings>,
    tokens: &Tokens<'_>,
) -> anyhow::Result<&'a mut Material> {
    current
        .as_mut()
        .map(|primitive| &mut primitive.material)
        .ok_or_else(|| anyhow!("{} before NEW_PRIMITIVE", tokens.keyword))
}

fn finish_primitive(primitive: PrimitiveSettings) -> anyhow::Result<Surface> {
    let shape = primitive.shape.with_context(|| {
        format!(
            "primitive opened at line {} has no SPHERE, BOX or PLANE",
            primitive.line
        )
    })?;
    Ok(Surface::new(shape, primitive.material))
}
