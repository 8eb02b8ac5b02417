//! # ceres-matrix
//!
//! Dense matrices with borrowed strided windows, and the symmetric
//! decompositions the likelihood code is built on.
//!
//! ## Building Blocks
//!
//! ```mermaid
//! graph LR
//!     A["Matrix"] -->|".extract() / .transpose() / .row()"| B["ArrayView (window)"]
//!     B -->|"cholesky_lower()"| C["L (in place)"]
//!     B -->|"xxt() / llt() / uut() / xtsx()"| D["symmetric Matrix"]
//!     B -->|"inverse()"| E["S⁻¹ (Cholesky, LU fallback)"]
//!     F["BandMatrix"] -->|".cholesky()?"| G["BandCholesky"]
//! ```
//!
//! Windows are plain `ndarray` views: an offset plus one stride per axis
//! into the owner's buffer. Every algorithm takes views, so it runs on a
//! whole matrix, a sub-block, or a transposed window alike.
//!
//! ## Glossary
//!
//! | Term | Item | Meaning |
//! |------|------|---------|
//! | window | [`Matrix::extract()`] | Non-owning view into a sub-block |
//! | zero tolerance | [`default_tolerance()`] | Pivots within it count as exact zeros |
//! | band width | [`BandMatrix::width()`] | Number of stored diagonals |

mod band;
mod error;
mod lu;
mod matrix;
mod symmetric;
mod triangular;

pub use band::{BandCholesky, BandMatrix};
pub use error::MatrixError;
pub use lu::LuDecomposition;
pub use matrix::Matrix;
pub use symmetric::{
    CholeskyOptions, cholesky_lower, cholesky_lower_with_tolerance, default_tolerance, inverse, llt,
    randomize, uut, xtsx, xtx, xxt,
};
pub use triangular::{lower_inverse, solve_lower, solve_lower_transpose};
