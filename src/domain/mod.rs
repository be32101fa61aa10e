// Domain layer - Vital-sign models and generation parameters
pub mod generation;
pub mod vitals;
