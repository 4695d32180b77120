use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, CommandResult};
use crate::element::{ObjectId, SceneObject};
use crate::layer::{Layer, LayerId};

/// One undoable scene mutation, carrying enough state to apply it in both
/// directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Insert `object` into `layer` at z-position `index`
    AddObject {
        object: SceneObject,
        layer: LayerId,
        index: usize,
    },

    /// Remove `object`, which sat in `layer` at `index`
    RemoveObject {
        object: SceneObject,
        layer: LayerId,
        index: usize,
    },

    /// Replace an object's state
    ModifyObject {
        before: SceneObject,
        after: SceneObject,
    },

    /// Drop an (already emptied) layer that sat at `index`
    DeleteLayer { index: usize, layer: Layer },

    /// Several commands recorded as a single history entry
    Batch {
        label: String,
        commands: Vec<Command>,
    },
}

impl Command {
    /// Short description shown in the history panel
    pub fn label(&self) -> String {
        match self {
            Command::AddObject { object, .. } => format!("Add {}", object.type_name()),
            Command::RemoveObject { object, .. } => format!("Remove {}", object.type_name()),
            Command::ModifyObject { after, .. } => format!("Edit {}", after.type_name()),
            Command::DeleteLayer { layer, .. } => format!("Delete layer '{}'", layer.name),
            Command::Batch { label, .. } => label.clone(),
        }
    }

    /// Ids of the objects this command touches
    pub fn object_ids(&self) -> Vec<ObjectId> {
        match self {
            Command::AddObject { object, .. } | Command::RemoveObject { object, .. } => {
                vec![object.id()]
            }
            Command::ModifyObject { after, .. } => vec![after.id()],
            Command::DeleteLayer { .. } => Vec::new(),
            Command::Batch { commands, .. } => {
                commands.iter().flat_map(Command::object_ids).collect()
            }
        }
    }

    /// Apply the command
    pub fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        match self {
            Command::AddObject { object, layer, index } => insert_object(ctx, object, *layer, *index),
            Command::RemoveObject { object, .. } => take_object(ctx, object.id()),
            Command::ModifyObject { after, .. } => replace_object(ctx, after),
            Command::DeleteLayer { layer, .. } => drop_layer(ctx, layer.id),
            Command::Batch { commands, .. } => {
                for (done, command) in commands.iter().enumerate() {
                    if let Err(err) = command.execute(ctx) {
                        for applied in commands[..done].iter().rev() {
                            if let Err(rollback) = applied.undo(ctx) {
                                log::error!("Rollback of '{}' failed: {}", applied.label(), rollback);
                            }
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
        }
    }

    /// Revert the command
    pub fn undo(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        match self {
            Command::AddObject { object, .. } => take_object(ctx, object.id()),
            Command::RemoveObject { object, layer, index } => insert_object(ctx, object, *layer, *index),
            Command::ModifyObject { before, .. } => replace_object(ctx, before),
            Command::DeleteLayer { index, layer } => {
                ctx.layers.restore_layer(*index, layer.clone());
                Ok(())
            }
            Command::Batch { commands, .. } => {
                for (done, command) in commands.iter().rev().enumerate() {
                    if let Err(err) = command.undo(ctx) {
                        for reverted in commands[commands.len() - done..].iter() {
                            if let Err(rollback) = reverted.execute(ctx) {
                                log::error!("Rollback of '{}' failed: {}", reverted.label(), rollback);
                            }
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
        }
    }
}

fn insert_object(ctx: &mut CommandContext<'_>, object: &SceneObject, layer: LayerId, index: usize) -> CommandResult {
    let id = object.id();
    if ctx.scene.contains(id) {
        return Err(CommandError::DuplicateObject(id));
    }
    let layer = if ctx.layers.get(layer).is_some() {
        layer
    } else {
        log::warn!("Layer {} is gone, re-adding object {} to the active layer", layer, id);
        ctx.layers.active_id()
    };
    let (visible, locked) = ctx
        .layers
        .get(layer)
        .map(|owner| (owner.visible, owner.locked))
        .ok_or(CommandError::UnknownLayer(layer))?;

    let mut object = object.clone();
    object.visible = visible;
    object.locked = locked;
    object.selectable = ctx.selectable;
    ctx.layers
        .assign(id, layer, Some(index))
        .map_err(|_| CommandError::UnknownLayer(layer))?;
    ctx.scene.insert(object);
    Ok(())
}

fn take_object(ctx: &mut CommandContext<'_>, id: ObjectId) -> CommandResult {
    ctx.scene.remove(id).ok_or(CommandError::UnknownObject(id))?;
    ctx.layers.unassign(id);
    Ok(())
}

/// Swap in `target`, keeping the flags owned by the layer and tool mode
fn replace_object(ctx: &mut CommandContext<'_>, target: &SceneObject) -> CommandResult {
    let id = target.id();
    let current = ctx.scene.get(id).ok_or(CommandError::UnknownObject(id))?;
    let mut next = target.clone();
    next.visible = current.visible;
    next.locked = current.locked;
    next.selectable = current.selectable;
    ctx.scene.insert(next);
    Ok(())
}

fn drop_layer(ctx: &mut CommandContext<'_>, id: LayerId) -> CommandResult {
    match ctx.layers.delete_layer(id) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(CommandError::LastLayer),
        Err(_) => Err(CommandError::UnknownLayer(id)),
    }
}
