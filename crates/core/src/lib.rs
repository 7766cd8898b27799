pub mod audio;
pub mod pipeline;
pub mod render;
pub mod resources;
pub mod segments;
pub mod shared;
pub mod transcription;
