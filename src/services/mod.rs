pub mod completion_service;
pub mod enrichment_service;
pub mod extraction;
pub mod geocoding_service;
pub mod graph_service;
pub mod json_repair;
pub mod place_service;
