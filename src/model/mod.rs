pub mod pipeline;
pub mod step;
pub mod value;

pub use pipeline::*;
pub use step::*;
pub use value::*;
