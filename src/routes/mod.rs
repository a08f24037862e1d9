// # Routes Module
//
// - HTTP route handlers, grouped by resource.
//
//  ## Available Route Modules
// - `health`: liveness and readiness endpoints
// - `auth`: registration and login
// - `news`: news CRUD, mounted behind the auth gate unless REQUIRE_AUTH=false

/// Health check and monitoring endpoints
pub mod health;

/// Registration and login endpoints
pub mod auth;

/// News article endpoints
pub mod news;
