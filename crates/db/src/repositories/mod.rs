pub mod cache_repo;
pub mod food_repo;
pub mod job_repo;
pub mod result_repo;
