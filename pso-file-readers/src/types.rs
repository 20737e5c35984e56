use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Default, Copy, Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Vec3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vec3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3<f32>> for glam::Vec3 {
    fn from(value: Vec3<f32>) -> Self {
        glam::Vec3::new(value.x, value.y, value.z)
    }
}

impl From<glam::Vec3> for Vec3<f32> {
    fn from(value: glam::Vec3) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}
