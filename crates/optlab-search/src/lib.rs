mod error;
pub mod multivariate;
pub mod scalar;

pub use error::{SearchError, SearchResult};
pub use multivariate::{GradientOptions, HookeJeevesOptions, VectorMinimum, gradient_descent, hooke_jeeves};
pub use scalar::{ScalarMinimum, ScalarOptions, golden_section, newton, tangent_intersection};
