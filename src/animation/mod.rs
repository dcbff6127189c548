pub mod bezier;
pub mod keyframe;
pub mod stepped;
