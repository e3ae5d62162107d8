//! Direct factorizations
//!
//! - [`lu_factorize`]: LU decomposition with partial pivoting, applied to blocks
//! - [`thin_qr`]: thin QR of a tall block by modified Gram-Schmidt

mod lu;
mod qr;

pub use lu::{LuError, LuFactorization, lu_factorize};
pub use qr::{QrError, QrFactorization, thin_qr};
