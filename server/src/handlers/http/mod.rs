pub mod admin;
pub mod auth;
pub mod jobs;
pub mod routes;
pub mod users;
pub mod utils;
