pub mod feedback_repository;
pub mod model;
