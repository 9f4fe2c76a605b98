mod shim;

pub use shim::ShimError;
