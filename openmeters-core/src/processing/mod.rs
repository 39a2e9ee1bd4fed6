pub mod peak_meter;
pub mod rms_meter;
pub mod sample_converter;
