use std::collections::{BTreeMap, BTreeSet};

use egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::element::{
    ObjectId, ObjectKind, ObjectStyle, PropertyKey, PropertyValue, SceneObject,
};
use crate::error::{EditorError, EditorResult};

/// Serialized copy of every live object, used for session snapshots
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub objects: Vec<SceneObject>,
    pub selection: Vec<ObjectId>,
}

impl SceneSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Owner of the live object set and the current selection.
///
/// Paint order is not stored here; it is derived from the layer stack.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    objects: BTreeMap<ObjectId, SceneObject>,
    selection: BTreeSet<ObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Like [`Scene::get`] but reports a missing id as an error
    pub fn object(&self, id: ObjectId) -> EditorResult<&SceneObject> {
        self.objects.get(&id).ok_or(EditorError::UnknownObject(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Create an object on `page` and return its id
    pub fn create_object(&mut self, page: u32, kind: ObjectKind, style: ObjectStyle) -> ObjectId {
        self.insert(SceneObject::new(page, kind, style))
    }

    /// Insert or replace an object by id
    pub fn insert(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id();
        self.objects.insert(id, object);
        id
    }

    /// Remove an object, dropping it from the selection as well
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.selection.remove(&id);
        self.objects.remove(&id)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.selection.clear();
    }

    pub fn property(&self, id: ObjectId, key: PropertyKey) -> EditorResult<Option<PropertyValue>> {
        Ok(self.object(id)?.property(key))
    }

    /// Set one property; the object is unchanged on error
    pub fn set_property(&mut self, id: ObjectId, key: PropertyKey, value: PropertyValue) -> EditorResult<()> {
        let object = self.objects.get_mut(&id).ok_or(EditorError::UnknownObject(id))?;
        object.set_property(key, value)?;
        Ok(())
    }

    pub fn selection(&self) -> &BTreeSet<ObjectId> {
        &self.selection
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selection.contains(&id)
    }

    /// Select `id`; with `additive` the selection is toggled instead of replaced.
    /// Returns false if the object cannot be selected.
    pub fn select(&mut self, id: ObjectId, additive: bool) -> bool {
        if !self.objects.get(&id).is_some_and(SceneObject::can_select) {
            return false;
        }
        if additive {
            if !self.selection.remove(&id) {
                self.selection.insert(id);
            }
        } else {
            self.selection.clear();
            self.selection.insert(id);
        }
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        let had_selection = !self.selection.is_empty();
        self.selection.clear();
        had_selection
    }

    /// Drop ids that are no longer selectable from the selection
    pub fn prune_selection(&mut self) {
        let objects = &self.objects;
        self.selection
            .retain(|id| objects.get(id).is_some_and(SceneObject::can_select));
    }

    pub fn set_selectable_all(&mut self, selectable: bool) {
        for object in self.objects.values_mut() {
            object.selectable = selectable;
        }
    }

    /// Topmost selectable object under `pos` on `page`.
    ///
    /// `paint_order` lists ids bottom to top.
    pub fn hit_test(&self, page: u32, pos: Pos2, paint_order: &[ObjectId], tolerance: f32) -> Option<ObjectId> {
        self.topmost(page, pos, paint_order, tolerance, SceneObject::can_select)
    }

    /// Topmost object under `pos` on `page` that passes `filter`
    pub fn topmost(
        &self,
        page: u32,
        pos: Pos2,
        paint_order: &[ObjectId],
        tolerance: f32,
        filter: impl Fn(&SceneObject) -> bool,
    ) -> Option<ObjectId> {
        paint_order.iter().rev().copied().find(|id| {
            self.objects.get(id).is_some_and(|object| {
                object.page == page && filter(object) && object.hit_test(pos, tolerance)
            })
        })
    }

    pub fn serialize(&self) -> SceneSnapshot {
        SceneSnapshot {
            objects: self.objects.values().cloned().collect(),
            selection: self.selection.iter().copied().collect(),
        }
    }

    /// Replace the whole scene with `snapshot`
    pub fn restore(&mut self, snapshot: SceneSnapshot) {
        self.objects = snapshot
            .objects
            .into_iter()
            .map(|object| (object.id(), object))
            .collect();
        self.selection = snapshot
            .selection
            .into_iter()
            .filter(|id| self.objects.contains_key(id))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;
    use egui::{Color32, Rect, pos2, vec2};

    fn square(x: f32) -> SceneObject {
        factory::rectangle(1, Rect::from_min_size(pos2(x, 0.0), vec2(20.0, 20.0)), ObjectStyle::default())
    }

    #[test]
    fn unknown_object_is_reported() {
        let mut scene = Scene::new();
        let missing = ObjectId::new();
        let err = scene
            .set_property(missing, PropertyKey::Opacity, PropertyValue::Number(0.5))
            .unwrap_err();
        assert_eq!(err, EditorError::UnknownObject(missing));
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut scene = Scene::new();
        let bottom = scene.insert(square(0.0));
        let top = scene.insert(square(10.0));
        let order = [bottom, top];
        assert_eq!(scene.hit_test(1, pos2(15.0, 5.0), &order, 0.0), Some(top));
        assert_eq!(scene.hit_test(1, pos2(5.0, 5.0), &order, 0.0), Some(bottom));
        assert_eq!(scene.hit_test(2, pos2(5.0, 5.0), &order, 0.0), None);

        scene.get_mut(top).unwrap().locked = true;
        assert_eq!(scene.hit_test(1, pos2(15.0, 5.0), &order, 0.0), Some(bottom));
    }

    #[test]
    fn additive_select_toggles() {
        let mut scene = Scene::new();
        let a = scene.insert(square(0.0));
        let b = scene.insert(square(50.0));
        assert!(scene.select(a, false));
        assert!(scene.select(b, true));
        assert_eq!(scene.selection().len(), 2);
        assert!(scene.select(a, true));
        assert_eq!(scene.selection().iter().copied().collect::<Vec<_>>(), vec![b]);

        scene.remove(b);
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn snapshot_restores_identical_scene() {
        let mut scene = Scene::new();
        let text = scene.insert(factory::text(1, pos2(4.0, 4.0), "Hello", Color32::BLACK));
        scene.insert(square(30.0));
        scene.select(text, false);

        let json = scene.serialize().to_json().unwrap();
        let mut restored = Scene::new();
        restored.restore(SceneSnapshot::from_json(&json).unwrap());
        assert_eq!(restored, scene);
    }
}
