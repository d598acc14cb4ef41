//! Модель географических записей.
//!
//! Три закрытых вида записей: [`Point`], [`Line`] и [`Relation`]. Все они
//! несут общие метаданные [`Metadata`] и список тегов [`Tags`]. Записи —
//! обычные значения: их создаёт вызывающий код, кодек только читает и
//! собирает их заново.

pub mod record;
pub mod tags;
pub mod timestamp;

pub use record::*;
pub use tags::*;
pub use timestamp::*;
