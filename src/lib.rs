//! Keyreel evaluates keyframe-animated motion-graphics projects and composites them into frames.
//!
//! - Load and validate a [`Project`] (compositions of shapes, text, bitmaps, nested instances)
//! - Create a [`RenderSession`]
//! - Render frames onto any [`DrawSurface`], e.g. the raster [`CpuSurface`] or a
//!   [`RecordingSurface`] for inspection
#![forbid(unsafe_code)]

pub mod animation;
pub mod foundation;
pub mod geometry;
pub mod media;
pub mod paint;
pub mod render;
pub mod scene;
pub mod session;
pub mod transform;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{KeyreelError, KeyreelResult};

pub use crate::animation::keyframe::{AnimatedProperty, Keyframe, SampleCtx};
pub use crate::media::frame::MediaFrame;
pub use crate::media::provider::{DirMediaProvider, InMemoryMedia, MediaProvider, NoMedia};
pub use crate::media::tracker::MediaTracker;
pub use crate::paint::gradient::Brush;
pub use crate::render::cpu::{CpuSurface, FrameRgba};
pub use crate::render::recording::{DrawCommand, RecordingSurface};
pub use crate::render::scene::{DrawOutcome, SceneOpts, SceneRenderer};
pub use crate::render::surface::{DrawSurface, LayerBlend};
pub use crate::render::surface_pool::SurfacePoolOpts;
pub use crate::scene::project::{Background, Composition, Object, ObjectKind, ObjectRef, Project};
pub use crate::session::playback::{Playback, Tick};
pub use crate::session::render_session::{RenderSession, RenderSessionOpts};
