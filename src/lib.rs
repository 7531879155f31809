pub mod app;
pub mod catalog;
pub mod render;
pub mod tmdb;
pub mod view;
