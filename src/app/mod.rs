//! HTTP surface: routes, handlers and the server-rendered pages.

pub mod handlers;
pub mod pages;
pub mod routes;
pub mod state;
pub mod views;
