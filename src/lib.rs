pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod extractor;
pub mod features;
pub mod form;
pub mod live;
pub mod logging;
pub mod match_record;
pub mod model;
pub mod predict;
pub mod reference;
pub mod venue_stats;
