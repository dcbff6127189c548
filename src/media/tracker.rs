use std::collections::HashSet;

use crate::scene::project::{ObjectKind, Project};

/// Readiness bookkeeping for the streamed media a project references.
///
/// Playback may start once every tracked object has reported ready. Each object id counts once,
/// however many times it is instanced through nested compositions.
#[derive(Debug, Clone, Default)]
pub struct MediaTracker {
    ids: Vec<String>,
    ready: HashSet<String>,
}

impl MediaTracker {
    /// Track the video and sound objects reachable from the active composition.
    pub fn for_project(project: &Project) -> Self {
        let mut tracker = Self::default();
        let mut seen = HashSet::new();
        let mut visited = vec![false; project.compositions.len()];
        collect(project, project.active, &mut visited, &mut seen, &mut tracker.ids);
        tracing::debug!(media = tracker.ids.len(), "media tracked");
        tracker
    }

    /// Number of media objects to load.
    pub fn to_load(&self) -> usize {
        self.ids.len()
    }

    pub fn ready(&self) -> usize {
        self.ready.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.ids
            .iter()
            .filter(|id| !self.ready.contains(id.as_str()))
            .map(String::as_str)
    }

    /// Record that `object_id` can play. Returns `true` the first time a tracked id reports.
    pub fn notify_ready(&mut self, object_id: &str) -> bool {
        if !self.ids.iter().any(|id| id == object_id) {
            tracing::debug!(object_id, "readiness for untracked media ignored");
            return false;
        }
        self.ready.insert(object_id.to_owned())
    }

    /// Every tracked object has reported ready.
    pub fn is_ready(&self) -> bool {
        self.ready.len() == self.ids.len()
    }
}

fn collect(
    project: &Project,
    composition: usize,
    visited: &mut [bool],
    seen: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    let Some(c) = project.composition(composition) else {
        return;
    };
    if std::mem::replace(&mut visited[composition], true) {
        return;
    }
    for o in &c.objects {
        if o.is_media() && seen.insert(o.id.clone()) {
            out.push(o.id.clone());
        }
        if let ObjectKind::Composition { child, .. } = o.kind {
            collect(project, child, visited, seen, out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/tracker.rs"]
mod tests;
