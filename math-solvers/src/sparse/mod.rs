//! Sparse matrix structures (CSR format)

mod csr;

pub use csr::CsrMatrix;
