//! Единая система ошибок для кодека geobin.
//!
//! Все операции кодека возвращают [`GeoResult`], внутри которого лежит
//! [`StackError`] с корневой ошибкой и цепочкой контекстов.

pub mod ext;
pub mod macros;
pub mod stack;
pub mod status_code;
pub mod types;

// Publicly re-export all error types and functions from the submodules to
// simplify access from external code.
pub use ext::*;
pub use macros::*;
pub use stack::*;
pub use status_code::*;
pub use types::*;

pub type GeoResult<T> = Result<T, StackError>;
