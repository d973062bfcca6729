use std::sync::Arc;

use crate::foundation::error::StrobeResult;
use crate::scene::descriptor::SceneRegistry;

pub(crate) mod blob;
pub(crate) mod neural;
pub(crate) mod radar;

/// Registry holding every built-in scene.
pub fn registry() -> StrobeResult<SceneRegistry> {
    let mut reg = SceneRegistry::new();
    reg.register(Arc::new(blob::scene()))?;
    reg.register(Arc::new(neural::scene()))?;
    reg.register(Arc::new(radar::scene()))?;
    Ok(reg)
}
