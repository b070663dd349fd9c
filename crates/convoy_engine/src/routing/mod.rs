pub mod route_polyline;
pub mod route_resolver;
pub mod routing_service;
