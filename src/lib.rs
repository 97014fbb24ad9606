pub mod bvh;
pub mod config;
pub mod landmark;
pub mod recorder;
pub mod skeleton;
pub mod stereo;
