use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::animation::keyframe::AnimatedProperty;
use crate::foundation::core::{Affine, Canvas, Rgba8};
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::scene::model::{
    CompositionDef, Effect, Gradient, Mask, ObjectDef, ObjectIdDef, ProjectDef, Shape, Text,
    TransformDef, Vertex, TYPE_COMPOSITION, TYPE_DUMMY, TYPE_IMAGE, TYPE_SHAPE, TYPE_SOUND,
    TYPE_TEXT, TYPE_VIDEO,
};

/// Direct link to an object: composition index plus index in that composition's object list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub composition: usize,
    pub object: usize,
}

/// Animated object transform with its parent resolved at load time.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub anchor: AnimatedProperty,
    pub position: AnimatedProperty,
    pub scale: AnimatedProperty,
    /// Degrees.
    pub rotation: AnimatedProperty,
    pub parent: Option<ObjectRef>,
}

impl Transform {
    /// Transform that leaves coordinates unchanged.
    pub fn identity() -> Self {
        Self {
            anchor: AnimatedProperty::constant(vec![0.0, 0.0]),
            position: AnimatedProperty::constant(vec![0.0, 0.0]),
            scale: AnimatedProperty::constant(vec![1.0, 1.0]),
            rotation: AnimatedProperty::constant(vec![0.0]),
            parent: None,
        }
    }

    fn properties(&self) -> [(&'static str, &AnimatedProperty); 4] {
        [
            ("anchor", &self.anchor),
            ("position", &self.position),
            ("scale", &self.scale),
            ("rotation", &self.rotation),
        ]
    }
}

/// Type-specific payload of an [`Object`].
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    /// Instance of another composition.
    Composition {
        child: usize,
        /// Shift applied to this instance's visibility window.
        inpoint: f64,
    },
    Image {
        source_matrix: Option<Affine>,
    },
    Video {
        source_matrix: Option<Affine>,
        /// The provider frame stores alpha in a second frame stacked below the color frame.
        alpha_stacked: bool,
    },
    Shape(Option<Shape>),
    Text(Option<Text>),
    Sound,
    Dummy,
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Composition { .. } => "composition",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Shape(_) => "shape",
            Self::Text(_) => "text",
            Self::Sound => "sound",
            Self::Dummy => "dummy",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub id: String,
    pub kind: ObjectKind,
    /// Local start time (inclusive) in the owning composition's timeline.
    pub start: f64,
    /// Local stop time (exclusive).
    pub stop: f64,
    pub transform: Option<Transform>,
    pub opacity: AnimatedProperty,
    pub masks: Vec<Mask>,
    pub effects: Vec<Effect>,
    /// Opaque backdrop covering everything listed after it.
    pub is_fullscreen: bool,
}

impl Object {
    pub fn new(id: impl Into<String>, kind: ObjectKind, start: f64, stop: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            start,
            stop,
            transform: None,
            opacity: AnimatedProperty::constant(vec![1.0]),
            masks: Vec::new(),
            effects: Vec::new(),
            is_fullscreen: false,
        }
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    pub fn has_masks(&self) -> bool {
        !self.masks.is_empty()
    }

    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    /// Video and sound objects, which depend on streamed media.
    pub fn is_media(&self) -> bool {
        matches!(self.kind, ObjectKind::Video { .. } | ObjectKind::Sound)
    }

    /// Half-open playback window `[start, end)` given the enclosing nested offset.
    pub fn visibility_window(&self, nested_offset: f64) -> (f64, f64) {
        let shift = match self.kind {
            ObjectKind::Composition { inpoint, .. } => nested_offset + inpoint,
            _ => nested_offset,
        };
        (shift + self.start, shift + self.stop)
    }

    pub fn is_visible_at(&self, time: f64, nested_offset: f64) -> bool {
        let (start, end) = self.visibility_window(nested_offset);
        start <= time && time < end
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Composition {
    /// Milliseconds.
    pub duration: f64,
    /// Width over height of the composition's unit-height coordinate space.
    pub aspect: f64,
    /// Back-to-front draw order.
    pub objects: Vec<Object>,
}

/// How each frame is cleared before drawing.
#[derive(Clone, Debug, PartialEq)]
pub enum Background {
    Transparent,
    Solid(Rgba8),
    Gradient(Gradient),
}

/// Read-only, validated scene for a playback session.
#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    pub canvas: Canvas,
    /// Number of loops to play; 0 plays forever.
    pub loops: u32,
    pub active: usize,
    pub compositions: Vec<Composition>,
    pub background: Background,
}

impl Project {
    /// Parse and validate a project from JSON text.
    #[tracing::instrument(skip(json), fields(bytes = json.len()))]
    pub fn from_json(json: &str) -> KeyreelResult<Self> {
        let def: ProjectDef = serde_json::from_str(json)
            .map_err(|e| KeyreelError::serde(format!("parse project JSON: {e}")))?;
        Self::from_def(def)
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> KeyreelResult<Self> {
        let def: ProjectDef = serde_json::from_reader(r)
            .map_err(|e| KeyreelError::serde(format!("parse project JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse and validate a project from a JSON file on disk.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> KeyreelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KeyreelError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Build a project from already-resolved parts and validate it.
    pub fn new(
        canvas: Canvas,
        compositions: Vec<Composition>,
        background: Background,
    ) -> KeyreelResult<Self> {
        let project = Self {
            canvas,
            loops: 0,
            active: 0,
            compositions,
            background,
        };
        project.validate()?;
        Ok(project)
    }

    pub fn with_loops(mut self, loops: u32) -> Self {
        self.loops = loops;
        self
    }

    pub fn active(&self) -> &Composition {
        &self.compositions[self.active]
    }

    pub fn composition(&self, index: usize) -> Option<&Composition> {
        self.compositions.get(index)
    }

    pub fn object(&self, r: ObjectRef) -> Option<&Object> {
        self.compositions
            .get(r.composition)?
            .objects
            .get(r.object)
    }

    /// First object with `id`, scanning compositions in order.
    pub fn find(&self, id: &str) -> Option<ObjectRef> {
        self.compositions.iter().enumerate().find_map(|(ci, c)| {
            c.objects
                .iter()
                .position(|o| o.id == id)
                .map(|oi| ObjectRef {
                    composition: ci,
                    object: oi,
                })
        })
    }

    pub(crate) fn from_def(def: ProjectDef) -> KeyreelResult<Self> {
        let index = build_id_index(&def.compositions);

        let mut compositions = Vec::with_capacity(def.compositions.len());
        for (ci, c) in def.compositions.iter().enumerate() {
            let mut objects = Vec::with_capacity(c.objects.len());
            for o in &c.objects {
                let obj = resolve_object(o, &index).map_err(|e| {
                    KeyreelError::validation(format!(
                        "composition {ci}, object '{}': {}",
                        o.id.0,
                        e.detail()
                    ))
                })?;
                objects.push(obj);
            }
            compositions.push(Composition {
                duration: c.duration,
                aspect: c.aspect,
                objects,
            });
        }

        let background = match (def.gradient, def.color) {
            (Some(g), _) => Background::Gradient(g),
            (None, Some(c)) => Background::Solid(c),
            (None, None) => Background::Transparent,
        };

        let project = Self {
            canvas: Canvas {
                width: def.width,
                height: def.height,
            },
            loops: def.loops,
            active: def.active,
            compositions,
            background,
        };
        project.validate()?;
        tracing::debug!(
            compositions = project.compositions.len(),
            objects = project
                .compositions
                .iter()
                .map(|c| c.objects.len())
                .sum::<usize>(),
            "project loaded"
        );
        Ok(project)
    }

    /// Check the authoring preconditions the renderer relies on.
    pub fn validate(&self) -> KeyreelResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(KeyreelError::validation("project width and height must be > 0"));
        }
        if self.active >= self.compositions.len() {
            return Err(KeyreelError::validation(format!(
                "active composition {} out of range ({} compositions)",
                self.active,
                self.compositions.len()
            )));
        }
        if let Background::Gradient(g) = &self.background {
            validate_gradient(g).map_err(|e| prefix("background".to_owned(), e))?;
        }

        for (ci, c) in self.compositions.iter().enumerate() {
            if !c.aspect.is_finite() || c.aspect <= 0.0 {
                return Err(KeyreelError::validation(format!(
                    "composition {ci}: aspect must be finite and > 0"
                )));
            }
            if !c.duration.is_finite() || c.duration < 0.0 {
                return Err(KeyreelError::validation(format!(
                    "composition {ci}: duration must be finite and >= 0"
                )));
            }
            for o in &c.objects {
                self.validate_object(o)
                    .map_err(|e| prefix(format!("composition {ci}, object '{}'", o.id), e))?;
            }
        }

        self.check_parent_cycles()?;
        self.check_composition_cycles()?;
        Ok(())
    }

    fn validate_object(&self, o: &Object) -> KeyreelResult<()> {
        check_property("opacity", &o.opacity)?;
        if let Some(t) = &o.transform {
            for (name, p) in t.properties() {
                check_property(name, p)?;
            }
            if let Some(parent) = t.parent {
                let Some(p) = self.object(parent) else {
                    return Err(KeyreelError::validation("parent reference out of range"));
                };
                if p.transform.is_none() {
                    return Err(KeyreelError::validation(format!(
                        "parent '{}' has no transform",
                        p.id
                    )));
                }
            }
        }
        for (i, m) in o.masks.iter().enumerate() {
            check_vertex_list(&m.vertex_list).map_err(|e| prefix(format!("mask {i}"), e))?;
            check_property("feather", &m.feather).map_err(|e| prefix(format!("mask {i}"), e))?;
        }
        for (i, fx) in o.effects.iter().enumerate() {
            validate_effect(fx).map_err(|e| prefix(format!("effect {i}"), e))?;
        }
        match &o.kind {
            ObjectKind::Composition { child, .. } => {
                if *child >= self.compositions.len() {
                    return Err(KeyreelError::validation(format!(
                        "composition index {child} out of range"
                    )));
                }
            }
            ObjectKind::Shape(Some(s)) => validate_shape(s)?,
            ObjectKind::Text(Some(t)) => {
                check_property("text size", &t.size)?;
                check_property("text color", &t.color)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn check_parent_cycles(&self) -> KeyreelResult<()> {
        for (ci, c) in self.compositions.iter().enumerate() {
            for oi in 0..c.objects.len() {
                let start = ObjectRef {
                    composition: ci,
                    object: oi,
                };
                let mut cursor = Some(start);
                let mut depth = 0usize;
                while let Some(r) = cursor {
                    cursor = self
                        .object(r)
                        .and_then(|o| o.transform.as_ref())
                        .and_then(|t| t.parent);
                    if cursor == Some(start) || depth > self.object_count() {
                        return Err(KeyreelError::validation(format!(
                            "transform parent chain of '{}' is cyclic",
                            c.objects[oi].id
                        )));
                    }
                    depth += 1;
                }
            }
        }
        Ok(())
    }

    fn check_composition_cycles(&self) -> KeyreelResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(project: &Project, ci: usize, marks: &mut [Mark]) -> KeyreelResult<()> {
            match marks[ci] {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    return Err(KeyreelError::validation(format!(
                        "composition {ci} contains itself"
                    )));
                }
                Mark::Unvisited => {}
            }
            marks[ci] = Mark::InProgress;
            for o in &project.compositions[ci].objects {
                if let ObjectKind::Composition { child, .. } = o.kind {
                    visit(project, child, marks)?;
                }
            }
            marks[ci] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.compositions.len()];
        for ci in 0..self.compositions.len() {
            visit(self, ci, &mut marks)?;
        }
        Ok(())
    }

    fn object_count(&self) -> usize {
        self.compositions.iter().map(|c| c.objects.len()).sum()
    }
}

fn build_id_index(compositions: &[CompositionDef]) -> HashMap<&str, ObjectRef> {
    let mut index = HashMap::new();
    for (ci, c) in compositions.iter().enumerate() {
        for (oi, o) in c.objects.iter().enumerate() {
            index.entry(o.id.0.as_str()).or_insert(ObjectRef {
                composition: ci,
                object: oi,
            });
        }
    }
    index
}

fn resolve_object(o: &ObjectDef, index: &HashMap<&str, ObjectRef>) -> KeyreelResult<Object> {
    let source_matrix = o.source_matrix.map(Affine::new);
    let kind = match o.type_tag {
        TYPE_COMPOSITION => {
            let child = o.composition.ok_or_else(|| {
                KeyreelError::validation("composition object without a composition index")
            })?;
            ObjectKind::Composition {
                child,
                inpoint: o.inpoint,
            }
        }
        TYPE_IMAGE => ObjectKind::Image { source_matrix },
        TYPE_VIDEO => ObjectKind::Video {
            source_matrix,
            alpha_stacked: o.is_alpha_stacked,
        },
        TYPE_SHAPE => ObjectKind::Shape(o.shape.clone()),
        TYPE_TEXT => ObjectKind::Text(o.text.clone()),
        TYPE_SOUND => ObjectKind::Sound,
        TYPE_DUMMY => ObjectKind::Dummy,
        other => {
            return Err(KeyreelError::validation(format!(
                "unknown object type {other}"
            )));
        }
    };

    let transform = o
        .transform
        .as_ref()
        .map(|t| resolve_transform(t, index))
        .transpose()?;

    Ok(Object {
        id: o.id.0.clone(),
        kind,
        start: o.start,
        stop: o.stop,
        transform,
        opacity: o
            .opacity
            .clone()
            .unwrap_or_else(|| AnimatedProperty::constant(vec![1.0])),
        masks: o.mask.clone(),
        effects: o.effect.clone(),
        is_fullscreen: o.is_fullscreen,
    })
}

fn resolve_transform(
    t: &TransformDef,
    index: &HashMap<&str, ObjectRef>,
) -> KeyreelResult<Transform> {
    let parent = match &t.parent {
        None => None,
        Some(ObjectIdDef(id)) => Some(*index.get(id.as_str()).ok_or_else(|| {
            KeyreelError::validation(format!("unknown transform parent '{id}'"))
        })?),
    };
    Ok(Transform {
        anchor: t.anchor.clone(),
        position: t.position.clone(),
        scale: t.scale.clone(),
        rotation: t.rotation.clone(),
        parent,
    })
}

fn check_property(name: &str, p: &AnimatedProperty) -> KeyreelResult<()> {
    p.validate().map_err(|e| prefix(name.to_owned(), e))
}

fn check_vertex_list(vertices: &[Vertex]) -> KeyreelResult<()> {
    if vertices.is_empty() {
        return Err(KeyreelError::validation("vertex list must not be empty"));
    }
    for (i, v) in vertices.iter().enumerate() {
        check_property(&format!("vertex {i} v"), &v.v)?;
        check_property(&format!("vertex {i} cn"), &v.cn)?;
        check_property(&format!("vertex {i} cp"), &v.cp)?;
    }
    Ok(())
}

fn validate_shape(s: &Shape) -> KeyreelResult<()> {
    check_vertex_list(&s.vertex_list)?;
    if let Some(c) = &s.color {
        check_property("color", c)?;
    }
    if let Some(g) = &s.gradient {
        g.validate().map_err(|e| prefix("gradient".to_owned(), e))?;
        for step in &g.steps {
            validate_gradient(&step.value)?;
        }
    }
    check_property("strokeWidth", &s.stroke_width)?;
    check_property("strokeColor", &s.stroke_color)
}

fn validate_gradient(g: &Gradient) -> KeyreelResult<()> {
    if g.stops.is_empty() {
        return Err(KeyreelError::validation("gradient must have at least one stop"));
    }
    Ok(())
}

fn validate_effect(fx: &Effect) -> KeyreelResult<()> {
    match fx {
        Effect::Blur { radius } => check_property("radius", radius),
        Effect::Opacity { value } => check_property("value", value),
        Effect::Tint { color, amount } => {
            check_property("color", color)?;
            check_property("amount", amount)
        }
    }
}

fn prefix(context: String, e: KeyreelError) -> KeyreelError {
    KeyreelError::validation(format!("{context}: {}", e.detail()))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/project.rs"]
mod tests;
