use crate::layer::LayerStack;
use crate::scene::Scene;

/// State a command reads and mutates.
///
/// `selectable` is the flag re-inserted objects get under the current tool mode.
#[derive(Debug)]
pub struct CommandContext<'a> {
    pub scene: &'a mut Scene,
    pub layers: &'a mut LayerStack,
    pub selectable: bool,
}

impl<'a> CommandContext<'a> {
    pub fn new(scene: &'a mut Scene, layers: &'a mut LayerStack, selectable: bool) -> Self {
        Self {
            scene,
            layers,
            selectable,
        }
    }
}
