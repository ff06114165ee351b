mod topology;

pub use topology::Topology;
