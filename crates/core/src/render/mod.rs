pub mod domain;
pub mod infrastructure;
pub mod render_admission;
pub mod render_orchestrator;
