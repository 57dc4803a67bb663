// Aspects: per-aspect token projections and vector synthesis.

pub mod key;
pub mod projection;
pub mod synth;

pub use key::{Aspect, AspectKey, VectorKey};
pub use projection::{aspect_counts, aspects_for_algorithm, project, BuiltinAspect, Projections};
pub use synth::{base_aspect, combine, CombinedVectors};
