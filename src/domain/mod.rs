// Domain layer: request/page models and the ports the session talks through.

pub mod model;
pub mod ports;
