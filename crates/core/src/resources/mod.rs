pub mod job_workspace;
pub mod output_artifact;
pub mod resource_error;
pub mod temp_resource_manager;
