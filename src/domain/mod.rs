// Domain layer: models, the phone key, roster configuration and ports.

pub mod model;
pub mod phone;
pub mod ports;
pub mod roster;
pub mod source;
