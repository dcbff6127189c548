use crate::animation::keyframe::AnimatedProperty;
use crate::animation::stepped::SteppedProperty;
use crate::foundation::core::Rgba8;
use serde::{Deserialize, Serialize};

/// Object type tags as authored in the document.
pub(crate) const TYPE_COMPOSITION: u16 = 1000;
pub(crate) const TYPE_IMAGE: u16 = 1001;
pub(crate) const TYPE_VIDEO: u16 = 1002;
pub(crate) const TYPE_SHAPE: u16 = 1003;
pub(crate) const TYPE_TEXT: u16 = 1004;
pub(crate) const TYPE_SOUND: u16 = 1005;
pub(crate) const TYPE_DUMMY: u16 = 1006;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProjectDef {
    pub(crate) width: u32,
    pub(crate) height: u32,
    #[serde(default)]
    pub(crate) loops: u32,
    #[serde(default)]
    pub(crate) active: usize,
    pub(crate) compositions: Vec<CompositionDef>,
    #[serde(default)]
    pub(crate) color: Option<Rgba8>,
    #[serde(default)]
    pub(crate) gradient: Option<Gradient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CompositionDef {
    pub(crate) duration: f64,
    pub(crate) aspect: f64,
    #[serde(default)]
    pub(crate) objects: Vec<ObjectDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectDef {
    pub(crate) id: ObjectIdDef,
    #[serde(rename = "type")]
    pub(crate) type_tag: u16,
    pub(crate) start: f64,
    pub(crate) stop: f64,
    #[serde(default)]
    pub(crate) inpoint: f64,
    #[serde(default)]
    pub(crate) transform: Option<TransformDef>,
    #[serde(default)]
    pub(crate) opacity: Option<AnimatedProperty>,
    #[serde(default)]
    pub(crate) shape: Option<Shape>,
    #[serde(default)]
    pub(crate) text: Option<Text>,
    #[serde(default)]
    pub(crate) composition: Option<usize>,
    #[serde(default)]
    pub(crate) mask: Vec<Mask>,
    #[serde(default)]
    pub(crate) effect: Vec<Effect>,
    #[serde(default)]
    pub(crate) is_fullscreen: bool,
    #[serde(default)]
    pub(crate) is_alpha_stacked: bool,
    #[serde(default)]
    pub(crate) source_matrix: Option<[f64; 6]>,
}

/// Object identifier; authored either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub(crate) struct ObjectIdDef(pub(crate) String);

impl<'de> Deserialize<'de> for ObjectIdDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Str(s) => Self(s),
            Repr::Int(i) => Self(i.to_string()),
            Repr::Float(f) => Self(f.to_string()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TransformDef {
    pub(crate) anchor: AnimatedProperty,
    pub(crate) position: AnimatedProperty,
    pub(crate) scale: AnimatedProperty,
    pub(crate) rotation: AnimatedProperty,
    #[serde(default)]
    pub(crate) parent: Option<ObjectIdDef>,
}

/// Animated vertex of a closed path: position plus absolute outgoing (`cn`) and incoming (`cp`)
/// handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub v: AnimatedProperty,
    pub cn: AnimatedProperty,
    pub cp: AnimatedProperty,
}

impl Vertex {
    /// Vertex whose handles sit on the vertex itself.
    pub fn corner(x: f64, y: f64) -> Self {
        Self {
            v: AnimatedProperty::constant(vec![x, y]),
            cn: AnimatedProperty::constant(vec![x, y]),
            cp: AnimatedProperty::constant(vec![x, y]),
        }
    }

    pub fn curved(v: [f64; 2], cn: [f64; 2], cp: [f64; 2]) -> Self {
        Self {
            v: AnimatedProperty::constant(v.to_vec()),
            cn: AnimatedProperty::constant(cn.to_vec()),
            cp: AnimatedProperty::constant(cp.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub vertex_list: Vec<Vertex>,
    /// Animated RGB fill in `[0, 1]`; takes precedence over `gradient`.
    #[serde(default)]
    pub color: Option<AnimatedProperty>,
    #[serde(default)]
    pub gradient: Option<SteppedProperty<Gradient>>,
    #[serde(default = "zero_property")]
    pub stroke_width: AnimatedProperty,
    #[serde(default = "black_property")]
    pub stroke_color: AnimatedProperty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mask {
    pub vertex_list: Vec<Vertex>,
    #[serde(default = "zero_property")]
    pub feather: AnimatedProperty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub text: String,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default = "default_font_size")]
    pub size: AnimatedProperty,
    #[serde(default = "black_property")]
    pub color: AnimatedProperty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GradientKind {
    Linear,
    Radial,
}

impl TryFrom<u8> for GradientKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Linear),
            1 => Ok(Self::Radial),
            other => Err(format!("unknown gradient type {other}")),
        }
    }
}

impl From<GradientKind> for u8 {
    fn from(value: GradientKind) -> Self {
        match value {
            GradientKind::Linear => 0,
            GradientKind::Radial => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Rgba8,
}

/// Abstract gradient: endpoints are fractions of the owning bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(rename = "type")]
    pub kind: GradientKind,
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub stops: Vec<GradientStop>,
}

/// Post-effect applied to an object's off-screen buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Effect {
    /// Gaussian blur with the given sigma in device pixels.
    Blur { radius: AnimatedProperty },
    /// Alpha multiply in `[0, 1]`.
    Opacity { value: AnimatedProperty },
    /// Mix toward an RGB color in `[0, 1]` by `amount`.
    Tint {
        color: AnimatedProperty,
        amount: AnimatedProperty,
    },
}

fn zero_property() -> AnimatedProperty {
    AnimatedProperty::constant(vec![0.0])
}

fn black_property() -> AnimatedProperty {
    AnimatedProperty::constant(vec![0.0, 0.0, 0.0])
}

fn default_font_size() -> AnimatedProperty {
    AnimatedProperty::constant(vec![0.1])
}
