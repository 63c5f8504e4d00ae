pub mod link_routes;
pub mod program_routes;
pub mod stats_routes;
