pub mod descriptor;
pub mod observation;
pub mod point;

pub use descriptor::MetricDescriptor;
pub use observation::Observation;
pub use point::DataPoint;
