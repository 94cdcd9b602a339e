mod build;
mod interaction;
mod transform;
mod view;

pub use build::{FloatingConsequence, GraphEdge, GraphFilter, GraphModel, GraphNode, grid_position};
pub use interaction::{DragState, InteractionController, hit_test};
pub use transform::{MAX_ZOOM, MIN_ZOOM, ViewTransform};
