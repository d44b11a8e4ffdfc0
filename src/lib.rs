//! Recursive Whitted-style ray tracer with a pinhole camera.
//!
//! Build a [`Scene`] through [`SceneBuilder`] (or load one with
//! [`scene_file::load_scene`]) and call [`Scene::render`].

extern crate nalgebra as na;

pub mod camera;
pub mod geometry;
pub mod lights;
pub mod rendering;
pub mod scene;
pub mod scene_file;
pub mod surface;


pub use camera::PinholeCamera;
pub use geometry::{Fp, Intersection, Point3f, Ray, Shape3D, Vec3f, EPS};
pub use lights::{LightLocation, LightSource};
pub use rendering::{radiance_to_rgb, LogCrateSink, LogSink};
pub use scene::{Scene, SceneBuilder, SecondaryRays};
pub use surface::{Hit, Material, Surface};
