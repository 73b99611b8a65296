pub mod crud;
pub mod pool;
