pub mod ai;
pub mod analytics;
pub mod health;
pub mod profile;
pub mod quizzes;
pub mod sessions;
pub mod subjects;
pub mod topics;
