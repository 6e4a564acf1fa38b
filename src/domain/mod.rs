// Domain layer: core models and ports (interfaces) implemented by core services and adapters.

pub mod model;
pub mod ports;
pub mod score;
