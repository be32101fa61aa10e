// Application layer - Generation pipeline use cases
pub mod batch_planner;
pub mod generation_service;
pub mod generation_worker;
pub mod query_service;
pub mod sample_generator;
pub mod sink_writer;
pub mod vital_repository;
