pub mod compositor;
pub mod descriptor;
pub mod fallback;
pub mod layers;
pub mod model;
pub mod recolor;
