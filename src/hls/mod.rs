pub mod bandwidth;
pub mod dummy;
pub mod padding;
pub mod rewrite;
pub mod sync;
pub mod track;
