use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::ObjectId;
use crate::error::{EditorError, EditorResult};

pub const DEFAULT_LAYER_NAME: &str = "Layer 1";

/// A unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    /// Display name of the layer
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Member ids, bottom to top
    pub objects: Vec<ObjectId>,
}

impl Layer {
    pub fn new(name: &str) -> Self {
        Self {
            id: LayerId::new(),
            name: name.to_string(),
            visible: true,
            locked: false,
            objects: Vec::new(),
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }
}

/// Ordered layers of a document plus the active one.
///
/// Every live object id is in exactly one layer. There is always at least
/// one layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerStack {
    /// Bottom to top
    layers: Vec<Layer>,
    active: LayerId,
    next_number: usize,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStack {
    /// A stack holding only the default layer
    pub fn new() -> Self {
        let layer = Layer::new(DEFAULT_LAYER_NAME);
        Self {
            active: layer.id,
            layers: vec![layer],
            next_number: 2,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    fn get_mut(&mut self, id: LayerId) -> EditorResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|layer| layer.id == id)
            .ok_or(EditorError::UnknownLayer(id))
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    pub fn active_id(&self) -> LayerId {
        self.active
    }

    pub fn active(&self) -> &Layer {
        // `active` always names a live layer
        self.get(self.active).unwrap_or(&self.layers[0])
    }

    /// Append a layer on top and make it active
    pub fn add_layer(&mut self, name: Option<&str>) -> LayerId {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("Layer {}", self.next_number),
        };
        self.next_number += 1;
        let layer = Layer::new(&name);
        let id = layer.id;
        self.layers.push(layer);
        self.active = id;
        log::info!("Added layer '{}' ({})", name, id);
        id
    }

    /// Remove a layer and return it with its member ids.
    ///
    /// Returns `None` without touching anything if `id` is the only layer.
    /// If the removed layer was active, the first remaining layer becomes active.
    pub fn delete_layer(&mut self, id: LayerId) -> EditorResult<Option<(usize, Layer)>> {
        let index = self.index_of(id).ok_or(EditorError::UnknownLayer(id))?;
        if self.layers.len() == 1 {
            log::warn!("Refusing to delete the last layer {}", id);
            return Ok(None);
        }
        let layer = self.layers.remove(index);
        if self.active == id {
            self.active = self.layers[0].id;
        }
        log::info!("Deleted layer '{}' with {} objects", layer.name, layer.objects.len());
        Ok(Some((index, layer)))
    }

    /// Put a previously deleted layer back at `index`
    pub fn restore_layer(&mut self, index: usize, layer: Layer) {
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
    }

    /// Flip visibility and return the new value
    pub fn toggle_visibility(&mut self, id: LayerId) -> EditorResult<bool> {
        let layer = self.get_mut(id)?;
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }

    /// Flip the lock and return the new value
    pub fn toggle_lock(&mut self, id: LayerId) -> EditorResult<bool> {
        let layer = self.get_mut(id)?;
        layer.locked = !layer.locked;
        Ok(layer.locked)
    }

    pub fn rename(&mut self, id: LayerId, name: &str) -> EditorResult<()> {
        let name = name.trim();
        let layer = self.get_mut(id)?;
        if !name.is_empty() {
            layer.name = name.to_owned();
        }
        Ok(())
    }

    pub fn set_active(&mut self, id: LayerId) -> EditorResult<()> {
        self.get_mut(id)?;
        self.active = id;
        Ok(())
    }

    /// Move a layer to `new_index` in paint order
    pub fn move_layer(&mut self, id: LayerId, new_index: usize) -> EditorResult<()> {
        let index = self.index_of(id).ok_or(EditorError::UnknownLayer(id))?;
        let layer = self.layers.remove(index);
        let new_index = new_index.min(self.layers.len());
        self.layers.insert(new_index, layer);
        Ok(())
    }

    /// Layer holding `object`, with the object's position in it
    pub fn layer_of(&self, object: ObjectId) -> Option<(LayerId, usize)> {
        self.layers.iter().find_map(|layer| {
            layer
                .objects
                .iter()
                .position(|id| *id == object)
                .map(|index| (layer.id, index))
        })
    }

    /// Record `object` in `layer` at `index` (appended when `None` or past the end).
    ///
    /// The object is first removed from any other layer so lists stay disjoint.
    pub fn assign(&mut self, object: ObjectId, layer: LayerId, index: Option<usize>) -> EditorResult<()> {
        self.get_mut(layer)?;
        self.unassign(object);
        let target = self.get_mut(layer)?;
        let index = index.unwrap_or(target.objects.len()).min(target.objects.len());
        target.objects.insert(index, object);
        Ok(())
    }

    /// Drop `object` from whichever layer holds it
    pub fn unassign(&mut self, object: ObjectId) -> Option<(LayerId, usize)> {
        let (layer, index) = self.layer_of(object)?;
        if let Ok(owner) = self.get_mut(layer) {
            owner.objects.remove(index);
        }
        Some((layer, index))
    }

    /// All object ids, bottom to top across layers
    pub fn paint_order(&self) -> Vec<ObjectId> {
        self.layers
            .iter()
            .flat_map(|layer| layer.objects.iter().copied())
            .collect()
    }

    /// Ids of visible layers only, bottom to top
    pub fn visible_order(&self) -> Vec<ObjectId> {
        self.layers
            .iter()
            .filter(|layer| layer.visible)
            .flat_map(|layer| layer.objects.iter().copied())
            .collect()
    }

    /// Bring a stack read from outside back in line with the live object ids.
    ///
    /// Keeps at least one layer and a live active layer, drops member ids that
    /// are dangling or listed twice, and files orphaned objects into the
    /// active layer. Returns how many ids had to be dropped or filed.
    pub fn reconcile(&mut self, live: &[ObjectId]) -> usize {
        if self.layers.is_empty() {
            self.layers.push(Layer::new(DEFAULT_LAYER_NAME));
        }
        if self.get(self.active).is_none() {
            self.active = self.layers[0].id;
        }
        self.next_number = self.next_number.max(self.layers.len() + 1);

        let alive: HashSet<ObjectId> = live.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut repaired = 0;
        for layer in &mut self.layers {
            let before = layer.objects.len();
            layer.objects.retain(|id| alive.contains(id) && seen.insert(*id));
            repaired += before - layer.objects.len();
        }

        let orphans: Vec<ObjectId> = live.iter().copied().filter(|id| !seen.contains(id)).collect();
        repaired += orphans.len();
        let active = self.active;
        if let Ok(layer) = self.get_mut(active) {
            layer.objects.extend(orphans);
        }
        repaired
    }
}
