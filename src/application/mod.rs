//! Application services: page resolution, handler dispatch and page writes.

pub mod admin;
pub mod error;
pub mod handlers;
pub mod interceptor;
pub mod render;
pub mod repos;
pub mod site;
pub mod views;
