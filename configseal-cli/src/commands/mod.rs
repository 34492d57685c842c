pub mod bundle;
pub mod keygen;
pub mod sync;
pub mod unseal;
