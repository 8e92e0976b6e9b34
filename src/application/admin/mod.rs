//! Application services for the administrative surface.

pub mod pages;
