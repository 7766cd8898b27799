pub mod remotion_renderer;
