pub mod ai;
pub mod analytics;
pub mod attendance;
pub mod backup_exchange;
pub mod classes;
pub mod conduct;
pub mod core;
pub mod gradebook;
pub mod planner;
pub mod seating;
pub mod students;
