pub mod blur;
pub mod composite;
pub mod cpu;
pub mod effects;
pub mod recording;
pub mod scene;
pub mod surface;
pub mod surface_pool;
pub mod text;
